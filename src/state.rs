/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: AuthService (token 検証)
 *   - targets: database target ごとの ReportDb
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{auth::AuthService, db::Targets};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub targets: Targets,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, targets: Targets) -> Self {
        Self { auth, targets }
    }
}
