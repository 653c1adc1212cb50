//! Schema validation of query, body and path parameters.

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::*;

fn paths(body: &Value) -> Vec<String> {
    body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["path"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn reversed_date_range_is_400_and_handler_not_called() {
    let fx = fixture();
    let res = call(
        fx.router(),
        get(
            "/api/v1/reports/sica/customs-entries?from=2024-02-01&to=2024-01-01",
            Some(&token("read:sica")),
        ),
    )
    .await;
    let (status, body) = json_of(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(paths(&body), vec!["query.from"]);
    assert_eq!(fx.total_calls(), 0);
}

#[tokio::test]
async fn missing_required_query_field_is_reported_on_the_field() {
    let fx = fixture();
    let res = call(
        fx.router(),
        get(
            "/api/v1/reports/accounting/collections?from=2024-01-01",
            Some(&token("read:accounting")),
        ),
    )
    .await;
    let (status, body) = json_of(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(paths(&body), vec!["query.to"]);
    assert!(!body["error"]["details"][0]["message"].as_str().unwrap().is_empty());
    assert_eq!(fx.total_calls(), 0);
}

#[tokio::test]
async fn wrongly_typed_query_field_is_reported_on_the_field() {
    let fx = fixture();
    let res = call(
        fx.router(),
        get(
            "/api/v1/reports/sica/customs-entries?from=2024-01-01&to=2024-01-31&client_id=abc",
            Some(&token("read:sica")),
        ),
    )
    .await;
    let (status, body) = json_of(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(paths(&body), vec!["query.client_id"]);
    assert_eq!(fx.total_calls(), 0);
}

#[tokio::test]
async fn wrongly_typed_list_element_is_reported_on_the_element() {
    let fx = fixture();
    let res = call(
        fx.router(),
        send_json(
            "POST",
            "/api/v1/reports/tracking/shipments/search",
            Some(&token("read:tracking")),
            &json!({"carriers": ["MAEU", 7]}),
        ),
    )
    .await;
    let (status, body) = json_of(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(paths(&body), vec!["body.carriers[1]"]);
    assert!(fx.tracking.calls().is_empty());
}

#[tokio::test]
async fn several_violations_are_listed() {
    let fx = fixture();
    let res = call(
        fx.router(),
        get(
            "/api/v1/reports/sica/customs-entries?from=2024-01-01&to=2024-01-31&client_id=0&customs_office=ABCD",
            Some(&token("read:sica")),
        ),
    )
    .await;
    let (status, body) = json_of(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(paths(&body), vec!["query.client_id", "query.customs_office"]);
}

#[tokio::test]
async fn bad_carrier_points_at_list_element() {
    let fx = fixture();
    let res = call(
        fx.router(),
        send_json(
            "POST",
            "/api/v1/reports/tracking/shipments/search",
            Some(&token("read:tracking")),
            &json!({"carriers": ["MAEU", "1X"]}),
        ),
    )
    .await;
    let (status, body) = json_of(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(paths(&body), vec!["body.carriers[1]"]);
    assert!(fx.tracking.calls().is_empty());
}

#[tokio::test]
async fn malformed_json_body_is_400_on_body() {
    let fx = fixture();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/reports/tracking/shipments/search")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token("read:tracking")))
        .body(axum::body::Body::from("{\"carriers\": ["))
        .unwrap();

    let (status, body) = json_of(call(fx.router(), req).await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(paths(&body), vec!["body"]);
}

#[tokio::test]
async fn unknown_body_field_is_rejected() {
    let fx = fixture();
    let res = call(
        fx.router(),
        send_json(
            "PUT",
            "/api/v1/reports/sica/invoices/42/status",
            Some(&token("write:sica")),
            &json!({"status": "paid", "amount": 100}),
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(fx.sica.calls().is_empty());
}

#[tokio::test]
async fn invalid_container_number_is_400_on_path() {
    let fx = fixture();
    let res = call(
        fx.router(),
        get(
            "/api/v1/reports/tracking/containers/CSQU3054384/events",
            Some(&token("read:tracking")),
        ),
    )
    .await;
    let (status, body) = json_of(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(paths(&body), vec!["path.container_number"]);
}

#[tokio::test]
async fn non_numeric_invoice_id_is_400_on_path() {
    let fx = fixture();
    let res = call(
        fx.router(),
        send_json(
            "PUT",
            "/api/v1/reports/sica/invoices/abc/status",
            Some(&token("write:sica")),
            &json!({"status": "paid"}),
        ),
    )
    .await;
    let (status, body) = json_of(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(paths(&body), vec!["path"]);
}

#[tokio::test]
async fn normalized_values_reach_the_adapter() {
    let fx = fixture();
    let res = call(
        fx.router(),
        get(
            "/api/v1/reports/tracking/containers/csqu3054383/events",
            Some(&token("read:tracking")),
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let calls = fx.tracking.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].binds,
        vec![customs_reports::services::db::BindValue::Text(
            "CSQU3054383".to_string()
        )]
    );
}
