//! Account, login and session tests

mod common;

use std::sync::Arc;

use axum_test::TestServer;
use common::{create_item, create_test_server, create_user, login, session, test_config};
use nixknack_server::store::{
    AchievementStore, ItemStore, PlanStore, PointStore, SessionStore, TaskStore, UserId,
};
use nixknack_server::{load_seed_data, routes, AppState, InMemoryStore};
use serde_json::{json, Value};

/// Test: registering creates a user with a zero balance
#[tokio::test]
async fn test_register_and_login() {
    let server = create_test_server();
    let cookie = create_user(&server, "alice", "hunter22").await;

    let response = server.get("/api/session").add_cookie(session(&cookie)).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["username"], "alice");

    let response = server.get("/api/points").add_cookie(session(&cookie)).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["points"], 0);
}

/// Test: usernames are unique
#[tokio::test]
async fn test_duplicate_username_rejected() {
    let server = create_test_server();
    create_user(&server, "alice", "hunter22").await;

    let response = server
        .post("/api/users")
        .json(&json!({ "username": "alice", "password": "other" }))
        .await;
    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

/// Test: empty username is a bad request
#[tokio::test]
async fn test_empty_username_rejected() {
    let server = create_test_server();

    let response = server
        .post("/api/users")
        .json(&json!({ "username": "  ", "password": "secret" }))
        .await;
    assert_eq!(response.status_code(), 400);
}

/// Test: cannot register while logged in
#[tokio::test]
async fn test_register_requires_logged_out() {
    let server = create_test_server();
    let cookie = create_user(&server, "alice", "hunter22").await;

    let response = server
        .post("/api/users")
        .add_cookie(session(&cookie))
        .json(&json!({ "username": "bob", "password": "secret" }))
        .await;
    assert_eq!(response.status_code(), 403);
}

/// Test: wrong password and unknown user both fail the same way
#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let server = create_test_server();
    create_user(&server, "alice", "hunter22").await;

    for (username, password) in [("alice", "wrong"), ("nobody", "hunter22")] {
        let response = server
            .post("/api/login")
            .json(&json!({ "username": username, "password": password }))
            .await;
        assert_eq!(response.status_code(), 401);
        let body: Value = response.json();
        assert_eq!(body["msg"], "Username or password is incorrect!");
    }
}

/// Test: logging out ends the session
#[tokio::test]
async fn test_logout() {
    let server = create_test_server();
    let cookie = create_user(&server, "alice", "hunter22").await;

    let response = server.post("/api/logout").add_cookie(session(&cookie)).await;
    assert_eq!(response.status_code(), 200);

    let response = server.get("/api/session").add_cookie(session(&cookie)).await;
    assert_eq!(response.status_code(), 401);

    let response = server.post("/api/logout").add_cookie(session(&cookie)).await;
    assert_eq!(response.status_code(), 401);

    // Can log back in
    login(&server, "alice", "hunter22").await;
}

/// Test: user lookup
#[tokio::test]
async fn test_list_and_get_users() {
    let server = create_test_server();
    create_user(&server, "alice", "hunter22").await;
    create_user(&server, "bob", "hunter22").await;

    let response = server.get("/api/users").await;
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 2);

    let response = server.get("/api/users/bob").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["username"], "bob");
    assert!(body.get("password_hash").is_none());

    let response = server.get("/api/users/carol").await;
    assert_eq!(response.status_code(), 404);
}

/// Test: renaming and changing the password
#[tokio::test]
async fn test_update_user() {
    let server = create_test_server();
    let cookie = create_user(&server, "alice", "hunter22").await;
    create_user(&server, "bob", "hunter22").await;

    let response = server
        .patch("/api/users")
        .add_cookie(session(&cookie))
        .json(&json!({ "username": "bob" }))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = server
        .patch("/api/users")
        .add_cookie(session(&cookie))
        .json(&json!({ "username": "alicia", "password": "new-pass" }))
        .await;
    assert_eq!(response.status_code(), 200);

    server.post("/api/logout").add_cookie(session(&cookie)).await;
    login(&server, "alicia", "new-pass").await;
}

/// Test: deleting an account removes everything the user owned
#[tokio::test]
async fn test_delete_user_cascades() {
    let store = InMemoryStore::new();
    load_seed_data(&store).unwrap();
    let state = Arc::new(AppState::new(store, test_config()));
    let server = TestServer::new(routes::create_router(state.clone())).unwrap();

    let cookie = create_user(&server, "alice", "hunter22").await;
    for i in 0..6 {
        create_item(
            &server,
            &cookie,
            json!({ "name": format!("Cable {}", i), "tags": ["Electronics"] }),
        )
        .await;
    }
    let response = server.post("/api/plans").add_cookie(session(&cookie)).await;
    assert_eq!(response.status_code(), 200);

    let me: Value = server.get("/api/session").add_cookie(session(&cookie)).await.json();
    let user = UserId(me["id"].as_u64().unwrap());
    assert!(!state.store.tasks_for_user(user).unwrap().is_empty());

    let response = server.delete("/api/users").add_cookie(session(&cookie)).await;
    assert_eq!(response.status_code(), 200);

    assert!(state.store.list_items(user).unwrap().is_empty());
    assert!(state.store.find_points(user).unwrap().is_none());
    assert!(state.store.plans_for_user(user).unwrap().is_empty());
    assert!(state.store.tasks_for_user(user).unwrap().is_empty());
    assert_eq!(state.store.get_progress(user, "Experience").unwrap(), 0);
    assert_eq!(state.store.delete_sessions_for_user(user).unwrap(), 0);

    let response = server.get("/api/users/alice").await;
    assert_eq!(response.status_code(), 404);

    let response = server
        .post("/api/login")
        .json(&json!({ "username": "alice", "password": "hunter22" }))
        .await;
    assert_eq!(response.status_code(), 401);
}

/// Test: protected endpoints reject requests without a session
#[tokio::test]
async fn test_requires_login() {
    let server = create_test_server();

    assert_eq!(server.get("/api/items").await.status_code(), 401);
    assert_eq!(server.get("/api/points").await.status_code(), 401);
    assert_eq!(server.post("/api/plans").await.status_code(), 401);
    assert_eq!(
        server
            .get("/api/session")
            .add_cookie(session("made-up-session"))
            .await
            .status_code(),
        401
    );
}
