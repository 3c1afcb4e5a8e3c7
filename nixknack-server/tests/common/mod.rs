//! Common test utilities for service integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use nixknack_server::{load_seed_data, routes, AppState, Config, InMemoryStore};
use serde_json::json;

pub const SESSION_COOKIE: &str = "nixknack_session";

/// Config with a cheap bcrypt cost and no static client
pub fn test_config() -> Config {
    Config {
        bcrypt_cost: 4,
        static_dir: "does-not-exist".to_string(),
        ..Config::default()
    }
}

/// Create a test server over a seeded in-memory store
pub fn create_test_server() -> TestServer {
    let store = InMemoryStore::new();
    load_seed_data(&store).expect("Failed to seed store");

    let state = Arc::new(AppState::new(store, test_config()));
    let app = routes::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Register a user, log in, and return the session cookie value
pub async fn create_user(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/api/users")
        .json(&json!({
            "username": username,
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    login(server, username, password).await
}

/// Log in and return the session cookie value
pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/api/login")
        .json(&json!({
            "username": username,
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    response
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string()
}

pub fn session(value: &str) -> cookie::Cookie<'static> {
    cookie::Cookie::new(SESSION_COOKIE, value.to_string())
}

/// Create an item and return its id
pub async fn create_item(server: &TestServer, session_cookie: &str, body: serde_json::Value) -> u64 {
    let response = server
        .post("/api/items")
        .add_cookie(session(session_cookie))
        .json(&body)
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    body["id"].as_u64().expect("No item id")
}
