//! API integration tests, driven through the router against an in-memory database

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};
use tower::ServiceExt;

use smartlib_server::{api, config::DatabaseConfig, AppConfig, AppState};

async fn test_app() -> Router {
    let config = AppConfig {
        database: DatabaseConfig::in_memory(),
        ..Default::default()
    };
    let state = AppState::build(config).await.expect("app state");
    api::router(state)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
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

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Helper to get an admin session token
async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("No token in response").to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_login() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["is_admin"], true);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn test_routes_require_token() {
    let app = test_app().await;

    let (status, _) = send(&app, Method::GET, "/api/v1/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/v1/loans", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_and_login_user() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "password": "secret1",
            "confirm_password": "secret1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert!(body.get("password_digest").is_none());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": "ALICE",
            "password": "secret1",
            "confirm_password": "secret1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["is_admin"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_mismatched_passwords() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": "bob",
            "password": "secret1",
            "confirm_password": "secret2"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 7);
}

#[tokio::test]
async fn test_borrow_and_return_flow() {
    let app = test_app().await;
    let token = admin_token(&app).await;

    let (status, book) = send(
        &app,
        Method::POST,
        "/api/v1/books",
        Some(&token),
        Some(json!({ "title": "Dune", "author": "Frank Herbert" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["available"], true);
    let book_id = book["id"].as_i64().unwrap();

    let (status, titles) = send(&app, Method::GET, "/api/v1/books/available", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles, json!(["Dune"]));

    let (status, record) = send(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(&token),
        Some(json!({ "student_name": "Alice", "book_title": "Dune" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["book_id"], book_id);
    assert_eq!(record["student_name"], "Alice");
    assert!(record["return_date"].is_null());
    let record_id = record["id"].as_i64().unwrap();

    let (_, book) = send(&app, Method::GET, &format!("/api/v1/books/{}", book_id), Some(&token), None).await;
    assert_eq!(book["available"], false);

    // A second borrow of the same book is refused
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(&token),
        Some(json!({ "student_name": "Bob", "book_id": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 5);

    let (status, open) = send(&app, Method::GET, "/api/v1/loans?open=true", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(open.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/loans/{}/return", record_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "returned");
    assert!(body["record"]["return_date"].is_string());

    let (_, book) = send(&app, Method::GET, &format!("/api/v1/books/{}", book_id), Some(&token), None).await;
    assert_eq!(book["available"], true);

    // Returning the same record twice finds no open record
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/loans/{}/return", record_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, history) = send(&app, Method::GET, "/api/v1/loans", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_return_by_student_and_title() {
    let app = test_app().await;
    let token = admin_token(&app).await;

    send(&app, Method::POST, "/api/v1/books", Some(&token), Some(json!({ "title": "Emma" }))).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/loans/return",
        Some(&token),
        Some(json!({ "student_name": "Carol", "book_title": "Emma" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(&token),
        Some(json!({ "student_name": "Carol", "book_title": "Emma" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/loans/return",
        Some(&token),
        Some(json!({ "student_name": "Carol", "book_title": "Emma" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["student_name"], "Carol");
}

#[tokio::test]
async fn test_duplicate_title_rejected() {
    let app = test_app().await;
    let token = admin_token(&app).await;

    let (status, _) = send(&app, Method::POST, "/api/v1/books", Some(&token), Some(json!({ "title": "Dune" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/api/v1/books", Some(&token), Some(json!({ "title": "  Dune " }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6);

    let (_, books) = send(&app, Method::GET, "/api/v1/books", Some(&token), None).await;
    assert_eq!(books.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_borrow_unknown_book() {
    let app = test_app().await;
    let token = admin_token(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(&token),
        Some(json!({ "student_name": "Alice", "book_title": "Nowhere" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_book_qr_code() {
    let app = test_app().await;
    let token = admin_token(&app).await;

    let (_, book) = send(&app, Method::POST, "/api/v1/books", Some(&token), Some(json!({ "title": "Dune" }))).await;
    let book_id = book["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/books/{}/qr", book_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let png = STANDARD.decode(body["qr_code"].as_str().unwrap()).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let request = Request::builder()
        .uri(format!("/api/v1/books/{}/qr.png", book_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let (status, _) = send(&app, Method::GET, "/api/v1/books/999/qr", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats() {
    let app = test_app().await;
    let token = admin_token(&app).await;

    send(&app, Method::POST, "/api/v1/books", Some(&token), Some(json!({ "title": "Dune" }))).await;
    send(&app, Method::POST, "/api/v1/books", Some(&token), Some(json!({ "title": "Emma" }))).await;
    send(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(&token),
        Some(json!({ "student_name": "Alice", "book_title": "Dune" })),
    )
    .await;

    let (status, stats) = send(&app, Method::GET, "/api/v1/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_books"], 2);
    assert_eq!(stats["available_books"], 1);
    assert_eq!(stats["borrowed_books"], 1);
    assert_eq!(stats["total_users"], 1);
}

#[tokio::test]
async fn test_openapi_document() {
    let app = test_app().await;

    let (status, doc) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/books"].is_object());
}
