/*
 * Responsibility
 * - GET /health (疎通用, 認証なし)
 * - DB には触れない。target の状態は /admin/targets
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
