/*
 * Responsibility
 * - Handler / gate から見える「認証済みコンテキスト」(Credential) の型
 * - middleware が検証して request extensions に格納する
 *
 * Notes
 * - JWT の検証ロジックは services/auth の責務
 * - request ごとに作られ、永続化はしない
 */

use std::collections::BTreeSet;

use crate::services::auth::VerifiedAccessToken;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `subject` は token の `sub`
/// - `role` は単一文字列（未指定なら "user"）
/// - `scopes` は `scope` claim を空白で分割した集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub subject: String,
    pub role: String,
    pub scopes: BTreeSet<String>,
}

impl AuthCtx {
    pub fn new(subject: impl Into<String>, role: impl Into<String>, scope: &str) -> Self {
        Self {
            subject: subject.into(),
            role: role.into(),
            scopes: scope.split_whitespace().map(str::to_owned).collect(),
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

impl From<VerifiedAccessToken> for AuthCtx {
    fn from(token: VerifiedAccessToken) -> Self {
        Self::new(token.subject, token.role, &token.scope)
    }
}
