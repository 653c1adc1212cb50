//! Authentication and scope/role gates in front of the report handlers.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

const CUSTOMS_ENTRIES: &str = "/api/v1/reports/sica/customs-entries?from=2024-01-01&to=2024-01-31";

#[tokio::test]
async fn health_needs_no_token() {
    let fx = fixture();
    let (status, body) = json_of(call(fx.router(), get("/api/v1/health", None)).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn missing_authorization_is_401_and_adapter_not_called() {
    let fx = fixture();
    let (status, body) = json_of(call(fx.router(), get(CUSTOMS_ENTRIES, None)).await).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"error": {"code": "UNAUTHORIZED", "message": "unauthorized"}})
    );
    assert_eq!(fx.total_calls(), 0);
}

#[tokio::test]
async fn malformed_authorization_is_401() {
    let fx = fixture();
    for value in ["Basic Zm9vOmJhcg==", "Bearer", "Bearer a b", "garbage"] {
        let req = axum::http::Request::builder()
            .uri(CUSTOMS_ENTRIES)
            .header("authorization", value)
            .body(axum::body::Body::empty())
            .unwrap();
        let res = call(fx.router(), req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{value}");
    }
    assert_eq!(fx.total_calls(), 0);
}

#[tokio::test]
async fn lowercase_scheme_is_accepted() {
    let fx = fixture();
    let req = axum::http::Request::builder()
        .uri(CUSTOMS_ENTRIES)
        .header("authorization", format!("bearer {}", token("read:sica")))
        .body(axum::body::Body::empty())
        .unwrap();

    let res = call(fx.router(), req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_issuer_is_401() {
    let fx = fixture();
    let mut c = claims("read:sica");
    c["iss"] = json!("https://someone-else.test");

    let res = call(fx.router(), get(CUSTOMS_ENTRIES, Some(&sign(&c)))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(fx.total_calls(), 0);
}

#[tokio::test]
async fn expired_token_is_401() {
    let fx = fixture();
    let mut c = claims("read:sica");
    c["exp"] = json!(now() - 3600);

    let res = call(fx.router(), get(CUSTOMS_ENTRIES, Some(&sign(&c)))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_scope_is_403_and_adapter_not_called() {
    let fx = fixture();
    let res = call(
        fx.router(),
        get(CUSTOMS_ENTRIES, Some(&token("read:tracking"))),
    )
    .await;
    let (status, body) = json_of(res).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert_eq!(fx.total_calls(), 0);
}

#[tokio::test]
async fn read_scope_cannot_write() {
    let fx = fixture();
    let res = call(
        fx.router(),
        send_json(
            "PUT",
            "/api/v1/reports/sica/invoices/42/status",
            Some(&token("read:sica")),
            &json!({"status": "paid"}),
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(fx.sica.calls().is_empty());
}

#[tokio::test]
async fn write_scope_runs_handler_and_calls_adapter_once() {
    let fx = fixture();
    let res = call(
        fx.router(),
        send_json(
            "PUT",
            "/api/v1/reports/sica/invoices/42/status",
            Some(&token("write:sica")),
            &json!({"status": "paid"}),
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(fx.sica.calls().len(), 1);
    assert_eq!(fx.total_calls(), 1);
}

#[tokio::test]
async fn unauthenticated_caller_gets_401_before_validation() {
    let fx = fixture();
    // invalid query, no token: authentication is checked first
    let res = call(
        fx.router(),
        get("/api/v1/reports/sica/customs-entries?from=nope", None),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_scope_gets_403_before_validation() {
    let fx = fixture();
    let res = call(
        fx.router(),
        get(
            "/api/v1/reports/sica/customs-entries?from=nope",
            Some(&token("read:tracking")),
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(fx.total_calls(), 0);
}

#[tokio::test]
async fn admin_role_is_required_for_targets() {
    let fx = fixture();
    let res = call(fx.router(), get("/api/v1/admin/targets", Some(&token("")))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let mut c = claims("");
    c["role"] = json!("admin");
    let (status, body) = json_of(
        call(fx.router(), get("/api/v1/admin/targets", Some(&sign(&c)))).await,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);
    assert_eq!(body[0], json!({"target": "sica", "backend": "sqlserver", "status": "up"}));
}

#[tokio::test]
async fn unknown_route_is_404_not_401() {
    let fx = fixture();
    let (status, body) = json_of(call(fx.router(), get("/api/v1/reports/nope", None)).await).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
