/*
 * Responsibility
 * - handler が受け取る型を HTTP から取り出す extractor 群
 * - auth_ctx: middleware が検証した Credential
 * - valid: schema validation 済みの query / body / path
 */
pub mod auth_ctx;
pub mod valid;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use valid::{RequestSchema, ValidJson, ValidPath, ValidQuery};
