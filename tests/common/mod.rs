#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::net::TcpListener;

use case_service::auth::JwtService;
use case_service::notifications::InMemoryNotificationStore;
use case_service::repository::Database;
use case_service::{app, AppState};

const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Boots the full service against a fresh in-memory database and returns its
/// base URL.
pub async fn spawn_app() -> String {
    let db = Database::connect_in_memory().await.unwrap();
    db.create_tables().await.unwrap();

    let jwt = JwtService::new(TEST_JWT_SECRET.to_string(), Some(1)).unwrap();
    let state = AppState::new(db, jwt, Arc::new(InMemoryNotificationStore::new()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Registers a fresh account and returns `(token, user_id)`.
pub async fn register_user(base: &str, client: &reqwest::Client, email: &str) -> (String, String) {
    let response = client
        .post(format!("{}/api/auth/register", base))
        .json(&json!({
            "email": email,
            "password": "password123",
            "name": "Test Analyst",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    let user_id = body["user"]["id"].as_str().unwrap().to_string();
    (token, user_id)
}

/// Creates a case and returns the response body.
pub async fn create_case(
    base: &str,
    client: &reqwest::Client,
    token: &str,
    title: &str,
    severity: &str,
) -> Value {
    let response = client
        .post(format!("{}/api/cases", base))
        .bearer_auth(token)
        .json(&json!({
            "title": title,
            "description": "Integration test case with enough descriptive text.",
            "severity": severity,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

/// Uploads an evidence record for the given case and returns the body.
pub async fn create_evidence(
    base: &str,
    client: &reqwest::Client,
    token: &str,
    case_id: &str,
    name: &str,
) -> Value {
    let response = client
        .post(format!("{}/api/evidence", base))
        .bearer_auth(token)
        .json(&json!({
            "name": name,
            "type": "log",
            "caseId": case_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

/// Records a timeline event for the given case and returns the body.
pub async fn create_timeline_event(
    base: &str,
    client: &reqwest::Client,
    token: &str,
    case_id: &str,
    severity: &str,
    title: &str,
) -> Value {
    let response = client
        .post(format!("{}/api/timeline", base))
        .bearer_auth(token)
        .json(&json!({
            "timestamp": "2025-01-15T10:30:00Z",
            "type": "alert",
            "source": "Test IDS",
            "severity": severity,
            "title": title,
            "description": "Integration test event.",
            "caseId": case_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}
