//! access token（JWT）検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: <scheme> <token>` を受け取る。scheme は大文字小文字を区別せず "bearer" のみ
//! - 署名 / iss / aud / exp(+leeway) の検証は AuthService 側で実施
//! - 失敗理由は warn ログにのみ残し、クライアントには常に同じ 401 を返す

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// 認証が必要な router に access middleware を適用する。
///
/// `route_layer` なので、未定義パスは 401 ではなく 404 のまま。
///
/// 例：
/// ```ignore
/// let reports = api::v1::routes::protected();
/// let reports = middleware::auth::access::apply(reports, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

/// `Authorization` header から bearer token を取り出す。
///
/// scheme は case-insensitive。token が空なら None。
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }

    Some(token)
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(req.headers()) else {
        tracing::warn!(path = %req.uri().path(), "missing or malformed bearer token");
        return Err(AppError::Unauthorized);
    };

    let verified = match state.auth.verify_verified(token) {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %req.uri().path(),
                "access token verification failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    let auth_ctx = AuthCtx::from(verified);
    tracing::debug!(subject = %auth_ctx.subject, role = %auth_ctx.role, "authenticated");

    // middleware → extractor / gate への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
