/*
 * Responsibility
 * - GET /admin/targets (role admin)
 * - 全 database target に ping し、up/down を返す
 * - 失敗理由はログのみ (body には出さない)
 */
use axum::{Json, extract::State};
use serde::Serialize;

use crate::{services::db::ReportDb, state::AppState};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TargetStatus {
    pub target: &'static str,
    pub backend: &'static str,
    pub status: &'static str,
}

async fn check_target(db: &ReportDb) -> TargetStatus {
    let status = match db.ping().await {
        Ok(()) => "up",
        Err(err) => {
            tracing::error!(
                target_db = db.target_name(),
                backend = db.backend_name(),
                error = %err,
                "target ping failed"
            );
            "down"
        }
    };

    TargetStatus {
        target: db.target_name(),
        backend: db.backend_name(),
        status,
    }
}

pub async fn targets(State(state): State<AppState>) -> Json<Vec<TargetStatus>> {
    let t = &state.targets;
    let (sica, accounting, tracking, warehouse) = tokio::join!(
        check_target(&t.sica),
        check_target(&t.accounting),
        check_target(&t.tracking),
        check_target(&t.warehouse),
    );

    Json(vec![sica, accounting, tracking, warehouse])
}
