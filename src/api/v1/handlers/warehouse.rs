use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::warehouse::{DwellQuery, InventoryQuery},
        extractors::ValidQuery,
    },
    error::AppError,
    repos::warehouse_repo,
    services::db::RowSet,
    state::AppState,
};

pub async fn inventory(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<InventoryQuery>,
) -> Result<Json<RowSet>, AppError> {
    let rows = warehouse_repo::inventory(
        &state.targets.warehouse,
        q.warehouse_id,
        q.as_of,
        q.sku.as_deref(),
    )
    .await?;

    Ok(Json(rows))
}

pub async fn dwell_times(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<DwellQuery>,
) -> Result<Json<RowSet>, AppError> {
    let rows =
        warehouse_repo::dwell_times(&state.targets.warehouse, q.warehouse_id, q.from, q.to).await?;

    Ok(Json(rows))
}
