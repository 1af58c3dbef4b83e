//! HTTP API tests
//!
//! Drive the full router (auth middleware, handlers, error bodies) with
//! in-process requests.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use common::*;
use pos_server::create_app;
use pos_server::services::AuthService;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    token: String,
    phone_id: i64,
}

async fn setup() -> TestApp {
    let pool = test_pool().await;
    let state = test_state(pool.clone());

    let auth = AuthService::new(pool.clone(), &state.config);
    auth.ensure_default_admin("admin-secret").await.unwrap();
    let token = auth.login("admin", "admin-secret").await.unwrap().access_token;

    let admin = shared::Actor::new(1, shared::UserRole::Admin);
    let phone = seed_phone(&pool, &admin, "Apple", "iPhone 13", "699.99", 3).await;

    TestApp {
        router: create_app(state),
        token,
        phone_id: phone.id,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>, HeaderMap) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec(), headers)
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_health_is_public() {
    let app = setup().await;

    let (status, body, _) = send(&app, Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["database"], "connected");
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = setup().await;

    let (status, body, _) = send(&app, Method::GET, "/api/v1/phones", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "UNAUTHORIZED");

    let (status, _, _) = send(&app, Method::GET, "/api/v1/phones", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let app = setup().await;

    let (status, body, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_sale_lifecycle_over_http() {
    let app = setup().await;
    let token = Some(app.token.as_str());

    let (status, body, _) = send(
        &app,
        Method::POST,
        "/api/v1/sales",
        token,
        Some(json!({ "phone_id": app.phone_id, "quantity": 2, "payment_method": "cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let sale = json_body(&body);
    assert_eq!(sale["total_price"], "1399.98");
    let sale_id = sale["id"].as_i64().unwrap();

    let (status, body, _) = send(
        &app,
        Method::POST,
        "/api/v1/sales",
        token,
        Some(json!({ "phone_id": app.phone_id, "quantity": 2, "payment_method": "cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let error = json_body(&body);
    assert_eq!(error["error"]["code"], "INSUFFICIENT_STOCK");
    assert_eq!(error["error"]["available"], 1);
    assert_eq!(error["error"]["requested"], 2);

    let uri = format!("/api/v1/sales/{}/invoice", sale_id);
    let (status, body, _) = send(&app, Method::GET, &uri, token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["seller_name"], "Administrator");

    let uri = format!("/api/v1/sales/{}", sale_id);
    let (status, _, _) = send(&app, Method::DELETE, &uri, token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let uri = format!("/api/v1/phones/{}", app.phone_id);
    let (_, body, _) = send(&app, Method::GET, &uri, token, None).await;
    assert_eq!(json_body(&body)["quantity"], 3);
}

#[tokio::test]
async fn test_reports_over_http() {
    let app = setup().await;
    let token = Some(app.token.as_str());

    let (status, body, headers) = send(
        &app,
        Method::GET,
        "/api/v1/reports/stock?filter=low_stock&format=csv",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_str(&headers, "content-type"), Some("text/csv"));
    assert_eq!(header_str(&headers, "x-grand-total"), Some("2099.97"));
    let csv = String::from_utf8(body).unwrap();
    assert!(csv.starts_with("id,brand,model"));
    assert!(csv.contains("iPhone 13"));
    assert_eq!(csv.lines().last(), Some("Total,,,,,,2099.97"));

    let (status, body, _) = send(
        &app,
        Method::GET,
        "/api/v1/reports/sales?from=2024-02-01&to=2024-01-01",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"]["code"], "INVALID_RANGE");

    let (status, body, _) = send(
        &app,
        Method::GET,
        "/api/v1/reports/sales?from=2024-01-01&to=2024-01-31&group_by=fortnight",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"]["field"], "group_by");
}

#[tokio::test]
async fn test_sales_csv_carries_grand_total() {
    let app = setup().await;
    let token = Some(app.token.as_str());

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/v1/sales",
        token,
        Some(json!({
            "phone_id": app.phone_id,
            "quantity": 2,
            "payment_method": "cash",
            "sale_date": "2024-05-10"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body, headers) = send(
        &app,
        Method::GET,
        "/api/v1/reports/sales?from=2024-05-01&to=2024-05-31&group_by=month&format=csv",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_str(&headers, "x-grand-total"), Some("1399.98"));
    let csv = String::from_utf8(body).unwrap();
    assert_eq!(
        csv.lines().collect::<Vec<_>>(),
        vec![
            "label,sales_count,total_quantity,total_sales",
            "2024-05,1,2,1399.98",
            "Total,,,1399.98",
        ]
    );
}

#[tokio::test]
async fn test_malformed_requests_use_error_body() {
    let app = setup().await;
    let token = Some(app.token.as_str());

    // Unknown payment method in the JSON body
    let (status, body, _) = send(
        &app,
        Method::POST,
        "/api/v1/sales",
        token,
        Some(json!({ "phone_id": app.phone_id, "quantity": 1, "payment_method": "cheque" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json_body(&body);
    assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(error["error"]["field"], "body");

    // Non-integer query parameter
    let (status, body, _) = send(
        &app,
        Method::GET,
        "/api/v1/reports/stock?filter=low_stock&threshold=abc",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json_body(&body);
    assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(error["error"]["field"], "query");

    // Non-integer path segment
    let (status, body, _) = send(&app, Method::GET, "/api/v1/sales/latest", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"]["field"], "path");

    let uri = format!("/api/v1/phones/{}", app.phone_id);
    let (_, body, _) = send(&app, Method::GET, &uri, token, None).await;
    assert_eq!(json_body(&body)["quantity"], 3);
}

#[tokio::test]
async fn test_oversized_unit_price_is_a_validation_error() {
    let app = setup().await;
    let token = Some(app.token.as_str());

    let (status, body, _) = send(
        &app,
        Method::POST,
        "/api/v1/sales",
        token,
        Some(json!({
            "phone_id": app.phone_id,
            "quantity": 1,
            "payment_method": "cash",
            "unit_price": "79228162514264337593543950335"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json_body(&body);
    assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(error["error"]["field"], "unit_price");
    assert_eq!(error["error"]["message"], "Amount is out of range");
}
