use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::accounting::{CollectionsQuery, ReceivablesQuery},
        extractors::ValidQuery,
    },
    error::AppError,
    repos::accounting_repo,
    services::db::RowSet,
    state::AppState,
};

pub async fn receivables(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<ReceivablesQuery>,
) -> Result<Json<RowSet>, AppError> {
    let rows = accounting_repo::receivables(&state.targets.accounting, q.as_of, q.client_id).await?;

    Ok(Json(rows))
}

pub async fn collections(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<CollectionsQuery>,
) -> Result<Json<RowSet>, AppError> {
    let rows = accounting_repo::collections(&state.targets.accounting, q.from, q.to).await?;

    Ok(Json(rows))
}
