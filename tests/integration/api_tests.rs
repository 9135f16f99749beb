//! API integration tests
//!
//! The in-process tests drive the router over the memory store. The
//! `#[ignore]`d ones expect a server on localhost:8080 started with
//! `SHELFWISE_DATABASE__BACKEND=memory`.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use shelfwise_server::{
    api,
    config::{AppConfig, StorageBackend},
    models::{Capability, PermissionSet},
    repository::{memory::MemoryRepository, Store},
    services::Services,
    AppState,
};

fn test_app() -> (Router, Arc<MemoryRepository>) {
    let mut config = AppConfig::default();
    config.database.backend = StorageBackend::Memory;
    let store = Arc::new(MemoryRepository::new());
    let services = Services::new(
        store.clone(),
        config.auth.clone(),
        config.reservations.clone(),
    );
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    (api::router(state), store)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri));
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Register an account and return (actor id, token)
async fn register(app: &Router, name: &str) -> (i32, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": format!("{}@example.org", name.to_lowercase()),
            "name": name,
            "password": "correct horse"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["user"]["id"].as_i64().unwrap() as i32,
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn create_book(app: &Router, token: &str, title: &str, copies: i32) -> i32 {
    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(token),
        Some(json!({
            "title": title,
            "author": "Ursula K. Le Guin",
            "genre": "Science Fiction",
            "published_date": "1974-05-01",
            "publisher": "Harper & Row",
            "available_copies": copies
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap() as i32
}

fn due_date() -> String {
    (chrono::Utc::now() + chrono::Duration::days(14)).to_rfc3339()
}

#[tokio::test]
async fn test_health_and_readiness() {
    let (app, _) = test_app();

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");

    let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_register_and_login() {
    let (app, _) = test_app();
    register(&app, "Ada").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.org", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["user"].get("password").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.org", "password": "wrong horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "ADA@example.org", "name": "Ada", "password": "another one" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "name": "Bob", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_requires_token() {
    let (app, _) = test_app();
    let (id, token) = register(&app, "Ada").await;

    let (status, _) = send(&app, Method::GET, "/users/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/users/profile", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["permissions"]["can_create_items"], false);
}

#[tokio::test]
async fn test_catalog_requires_capabilities() {
    let (app, store) = test_app();
    let (librarian_id, librarian) = register(&app, "Librarian").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(&librarian),
        Some(json!({
            "title": "The Dispossessed",
            "author": "Ursula K. Le Guin",
            "genre": "Science Fiction",
            "published_date": "1974-05-01",
            "publisher": "Harper & Row"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 3);

    store
        .permissions_update(
            librarian_id,
            &PermissionSet::default()
                .with(Capability::CreateItems)
                .with(Capability::UpdateItems),
        )
        .await
        .unwrap();

    let id = create_book(&app, &librarian, "The Dispossessed", 2).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{}", id),
        Some(&librarian),
        Some(json!({ "genre": "Utopian fiction" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genre"], "Utopian fiction");
    assert_eq!(body["available_copies"], 2);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/books/{}", id),
        Some(&librarian),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/books?title=dispossessed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::POST,
        "/books",
        Some(&librarian),
        Some(json!({
            "title": "",
            "author": "Ursula K. Le Guin",
            "genre": "Science Fiction",
            "published_date": "1974-05-01",
            "publisher": "Harper & Row"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reservation_flow() {
    let (app, store) = test_app();
    let (librarian_id, librarian) = register(&app, "Librarian").await;
    let (_, alice) = register(&app, "Alice").await;
    let (_, bob) = register(&app, "Bob").await;
    store
        .permissions_update(librarian_id, &PermissionSet::all())
        .await
        .unwrap();
    let book_id = create_book(&app, &librarian, "The Lathe of Heaven", 1).await;

    let (status, reservation) = send(
        &app,
        Method::POST,
        "/reservations",
        Some(&alice),
        Some(json!({ "book_id": book_id, "due_date": due_date() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", reservation);
    assert_eq!(reservation["status"], "OUTSTANDING");
    assert_eq!(reservation["book"]["title"], "The Lathe of Heaven");
    assert_eq!(reservation["actor"]["name"], "Alice");
    let reservation_id = reservation["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/reservations",
        Some(&bob),
        Some(json!({ "book_id": book_id, "due_date": due_date() })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6);

    // Only the owner can return it
    let (status, _) = send(
        &app,
        Method::POST,
        "/reservations/return",
        Some(&bob),
        Some(json!({ "reservation_id": reservation_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/reservations/active", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/reservations/return",
        Some(&alice),
        Some(json!({ "reservation_id": reservation_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "RETURNED");

    let (status, _) = send(
        &app,
        Method::POST,
        "/reservations/return",
        Some(&alice),
        Some(json!({ "reservation_id": reservation_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, &format!("/books/{}", book_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_copies"], 1);
    assert_eq!(body["reservations"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, Method::GET, "/reservations/active", Some(&alice), None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = send(
        &app,
        Method::GET,
        "/users/reservations/history",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["status"], "RETURNED");
}

#[tokio::test]
async fn test_reservation_input_validation() {
    let (app, store) = test_app();
    let (librarian_id, librarian) = register(&app, "Librarian").await;
    store
        .permissions_update(librarian_id, &PermissionSet::all())
        .await
        .unwrap();
    let book_id = create_book(&app, &librarian, "Rocannon's World", 1).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/reservations",
        Some(&librarian),
        Some(json!({ "book_id": book_id, "due_date": "2001-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/reservations",
        Some(&librarian),
        Some(json!({ "book_id": 0, "due_date": due_date() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/reservations",
        Some(&librarian),
        Some(json!({ "book_id": 999, "due_date": due_date() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_permissions_and_deactivation() {
    let (app, _) = test_app();
    let (reader_id, reader) = register(&app, "Reader").await;
    let (other_id, _) = register(&app, "Other").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/users/{}/permissions", reader_id),
        Some(&reader),
        Some(json!({
            "can_create_items": true,
            "can_update_items": true,
            "can_delete_items": true,
            "can_update_actors": true,
            "can_delete_actors": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", reader_id),
        Some(&reader),
        Some(json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/users/{}", other_id),
        Some(&reader),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/users/{}", reader_id),
        Some(&reader),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The token is still signed but the account is gone
    let (status, _) = send(&app, Method::GET, "/users/profile", Some(&reader), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

const BASE_URL: &str = "http://localhost:8080/api/v1";

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_live_health_check() {
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_live_register_and_search() {
    let client = reqwest::Client::new();
    let email = format!("live-{}@example.org", chrono::Utc::now().timestamp_micros());

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({ "email": email, "name": "Live Reader", "password": "correct horse" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let token = body["token"].as_str().expect("No token in response").to_string();

    let response = client
        .get(format!("{}/users/profile", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/books?available=true", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}
