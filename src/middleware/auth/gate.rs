//! Scope / role gates.
//!
//! These run after `access` has put an `AuthCtx` into the request extensions.
//! A request that reaches a gate without one is treated as unauthenticated (401);
//! an authenticated caller that lacks the requirement gets 403.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
struct RequiredScope(&'static str);

#[derive(Debug, Clone, Copy)]
struct RequiredRole(&'static str);

/// Require `scope` to be one of the caller's granted scopes on every route of `router`.
pub fn require_scope(router: Router<AppState>, scope: &'static str) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        RequiredScope(scope),
        scope_gate,
    ))
}

/// Require the caller's role to equal `role` on every route of `router`.
pub fn require_role(router: Router<AppState>, role: &'static str) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(RequiredRole(role), role_gate))
}

async fn scope_gate(
    State(RequiredScope(scope)): State<RequiredScope>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = req
        .extensions()
        .get::<AuthCtx>()
        .ok_or(AppError::Unauthorized)?;

    if !ctx.has_scope(scope) {
        tracing::warn!(
            subject = %ctx.subject,
            required_scope = scope,
            path = %req.uri().path(),
            "missing scope"
        );
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}

async fn role_gate(
    State(RequiredRole(role)): State<RequiredRole>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = req
        .extensions()
        .get::<AuthCtx>()
        .ok_or(AppError::Unauthorized)?;

    if !ctx.has_role(role) {
        tracing::warn!(
            subject = %ctx.subject,
            role = %ctx.role,
            required_role = role,
            path = %req.uri().path(),
            "role not allowed"
        );
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}
