/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health は認証なし、それ以外は access (401) → scope/role gate (403) → handler
 * - gate は route_layer で report ごとに掛ける
 * - 入力検証 (Valid* extractor) は認証と gate の後。validate → authenticate の順ではない:
 *   未認証なら不正な入力でも 401、scope 不足なら 403 を先に返す
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::api::v1::handlers::{accounting, admin, health::health, sica, tracking, warehouse};
use crate::middleware::auth::{access, require_role, require_scope};
use crate::state::AppState;

pub const READ_SICA: &str = "read:sica";
pub const WRITE_SICA: &str = "write:sica";
pub const READ_ACCOUNTING: &str = "read:accounting";
pub const READ_TRACKING: &str = "read:tracking";
pub const READ_WAREHOUSE: &str = "read:warehouse";
pub const ADMIN_ROLE: &str = "admin";

fn sica_read() -> Router<AppState> {
    let router = Router::new()
        .route(
            "/reports/sica/customs-entries",
            get(sica::customs_entries),
        )
        .route(
            "/reports/sica/operations/{reference}",
            get(sica::operation_by_reference),
        )
        .route(
            "/reports/sica/pending-revalidations",
            get(sica::pending_revalidations),
        )
        .route("/reports/sica/invoices", get(sica::invoices));

    require_scope(router, READ_SICA)
}

fn sica_write() -> Router<AppState> {
    let router = Router::new().route(
        "/reports/sica/invoices/{invoice_id}/status",
        put(sica::update_invoice_status),
    );

    require_scope(router, WRITE_SICA)
}

fn accounting() -> Router<AppState> {
    let router = Router::new()
        .route(
            "/reports/accounting/receivables",
            get(accounting::receivables),
        )
        .route(
            "/reports/accounting/collections",
            get(accounting::collections),
        );

    require_scope(router, READ_ACCOUNTING)
}

fn tracking() -> Router<AppState> {
    let router = Router::new()
        .route(
            "/reports/tracking/shipments/search",
            post(tracking::search_shipments),
        )
        .route(
            "/reports/tracking/containers/{container_number}/events",
            get(tracking::container_events),
        );

    require_scope(router, READ_TRACKING)
}

fn warehouse() -> Router<AppState> {
    let router = Router::new()
        .route("/reports/warehouse/inventory", get(warehouse::inventory))
        .route(
            "/reports/warehouse/dwell-times",
            get(warehouse::dwell_times),
        );

    require_scope(router, READ_WAREHOUSE)
}

fn admin() -> Router<AppState> {
    require_role(
        Router::new().route("/admin/targets", get(admin::targets)),
        ADMIN_ROLE,
    )
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(sica_read())
        .merge(sica_write())
        .merge(accounting())
        .merge(tracking())
        .merge(warehouse())
        .merge(admin());

    // added last = runs first: authenticate before any gate or extractor
    let protected = access::apply(protected, state);

    Router::new().route("/health", get(health)).merge(protected)
}
