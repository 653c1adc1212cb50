//! Authentication and authorization middleware.
//!
//! - `access`: bearer token -> `AuthCtx` in request extensions (401 on failure)
//! - `gate`: scope / role checks against that `AuthCtx` (403 on failure)

pub mod access;
pub mod gate;

pub use gate::{require_role, require_scope};
