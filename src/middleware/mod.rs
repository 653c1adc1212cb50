/*
 * Responsibility
 * - middlware の公開インターフェース (re-export)
 * - 認証 (access), 権限ゲート (gate), HTTP 横断処理, CORS, security headers
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
