/*
 * Responsibility
 * - /reports/sica/... handler
 * - validated DTO → sica_repo 呼び出し → rows (空なら [])
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::sica::{
            CustomsEntriesQuery, InvoiceStatusPath, InvoicesQuery, OperationPath,
            PendingRevalidationsQuery, UpdateInvoiceStatusRequest,
        },
        extractors::{AuthCtxExtractor, ValidJson, ValidPath, ValidQuery},
    },
    error::AppError,
    repos::sica_repo,
    services::db::RowSet,
    state::AppState,
};

pub async fn customs_entries(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<CustomsEntriesQuery>,
) -> Result<Json<RowSet>, AppError> {
    let rows = sica_repo::customs_entries(
        &state.targets.sica,
        q.from,
        q.to,
        q.client_id,
        q.customs_office.as_deref(),
    )
    .await?;

    Ok(Json(rows))
}

pub async fn operation_by_reference(
    State(state): State<AppState>,
    ValidPath(p): ValidPath<OperationPath>,
) -> Result<Json<RowSet>, AppError> {
    let rows = sica_repo::operation_by_reference(&state.targets.sica, &p.reference).await?;

    Ok(Json(rows))
}

pub async fn pending_revalidations(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<PendingRevalidationsQuery>,
) -> Result<Json<RowSet>, AppError> {
    let rows =
        sica_repo::pending_revalidations(&state.targets.sica, q.customs_office.as_deref()).await?;

    Ok(Json(rows))
}

pub async fn invoices(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<InvoicesQuery>,
) -> Result<Json<RowSet>, AppError> {
    let rows = sica_repo::invoices(&state.targets.sica, q.from, q.to, q.client_id).await?;

    Ok(Json(rows))
}

pub async fn update_invoice_status(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    ValidPath(p): ValidPath<InvoiceStatusPath>,
    ValidJson(req): ValidJson<UpdateInvoiceStatusRequest>,
) -> Result<Json<RowSet>, AppError> {
    tracing::info!(
        subject = %ctx.subject,
        invoice_id = p.invoice_id,
        status = %req.status,
        idempotent = req.idempotency_key.is_some(),
        "invoice status change requested"
    );

    let rows = sica_repo::update_invoice_status(
        &state.targets.sica,
        p.invoice_id,
        &req.status,
        req.reason.as_deref(),
        req.idempotency_key.as_deref(),
    )
    .await?;

    Ok(Json(rows))
}
