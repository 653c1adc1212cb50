/*
 * Responsibility
 * - /reports/tracking/... handler
 * - shipment search は validated body をそのまま JSON payload にする
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::tracking::{ContainerPath, ShipmentSearchRequest},
        extractors::{ValidJson, ValidPath},
    },
    error::AppError,
    repos::tracking_repo,
    services::db::RowSet,
    state::AppState,
};

pub async fn search_shipments(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ShipmentSearchRequest>,
) -> Result<Json<RowSet>, AppError> {
    let filters = serde_json::to_value(&req).map_err(|err| {
        tracing::error!(error = %err, "failed to encode shipment filters");
        AppError::Internal
    })?;

    let rows = tracking_repo::search_shipments(&state.targets.tracking, filters).await?;

    Ok(Json(rows))
}

pub async fn container_events(
    State(state): State<AppState>,
    ValidPath(p): ValidPath<ContainerPath>,
) -> Result<Json<RowSet>, AppError> {
    let rows = tracking_repo::container_events(&state.targets.tracking, &p.container_number).await?;

    Ok(Json(rows))
}
