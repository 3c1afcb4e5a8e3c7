//! Tag membership and recommendation tests

mod common;

use common::{create_item, create_test_server, create_user, session};
use serde_json::{json, Value};

/// Test: tags can be added, listed and removed
#[tokio::test]
async fn test_tag_membership() {
    let server = create_test_server();
    let cookie = create_user(&server, "alice", "hunter22").await;
    let id = create_item(&server, &cookie, json!({ "name": "Drill" })).await;

    let response = server
        .post(&format!("/api/items/{}/tags", id))
        .add_cookie(session(&cookie))
        .json(&json!({ "tags": ["Tools", "Garage"] }))
        .await;
    assert_eq!(response.status_code(), 200);

    // Adding a tag the item already has is not an error
    let response = server
        .post(&format!("/api/items/{}/tags", id))
        .add_cookie(session(&cookie))
        .json(&json!({ "tags": ["Tools"] }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = server
        .get(&format!("/api/items/{}/tags", id))
        .add_cookie(session(&cookie))
        .await
        .json();
    assert_eq!(body, json!(["Garage", "Tools"]));

    let response = server
        .delete(&format!("/api/items/{}/tags/Tools", id))
        .add_cookie(session(&cookie))
        .await;
    assert_eq!(response.status_code(), 200);

    // Second removal has nothing to remove
    let response = server
        .delete(&format!("/api/items/{}/tags/Tools", id))
        .add_cookie(session(&cookie))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = server
        .delete(&format!("/api/items/{}/tags/Nonexistent", id))
        .add_cookie(session(&cookie))
        .await;
    assert_eq!(response.status_code(), 404);
}

/// Test: only the owner can change an item's tags
#[tokio::test]
async fn test_tagging_requires_owner() {
    let server = create_test_server();
    let alice = create_user(&server, "alice", "hunter22").await;
    let bob = create_user(&server, "bob", "hunter22").await;
    let id = create_item(&server, &alice, json!({ "name": "Drill", "tags": ["Tools"] })).await;

    let response = server
        .post(&format!("/api/items/{}/tags", id))
        .add_cookie(session(&bob))
        .json(&json!({ "tags": ["Mine"] }))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = server
        .delete(&format!("/api/items/{}/tags/Tools", id))
        .add_cookie(session(&bob))
        .await;
    assert_eq!(response.status_code(), 403);
}

/// Test: an item's tags are only visible to its owner
#[tokio::test]
async fn test_item_tags_private_to_owner() {
    let server = create_test_server();
    let alice = create_user(&server, "alice", "hunter22").await;
    let bob = create_user(&server, "bob", "hunter22").await;
    let id = create_item(&server, &alice, json!({ "name": "Diary", "tags": ["Books"] })).await;

    let response = server
        .get(&format!("/api/items/{}/tags", id))
        .add_cookie(session(&bob))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = server
        .get(&format!("/api/items/{}/tags", id))
        .add_cookie(session(&alice))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>(), json!(["Books"]));
}

/// Test: the tag list merges the catalog with the user's own tags
#[tokio::test]
async fn test_list_tags() {
    let server = create_test_server();
    let cookie = create_user(&server, "alice", "hunter22").await;
    create_item(&server, &cookie, json!({ "name": "Stamp", "tags": ["Collectibles"] })).await;

    let body: Value = server.get("/api/tags").add_cookie(session(&cookie)).await.json();
    let tags: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();

    assert!(tags.contains(&"Collectibles"));
    assert!(tags.contains(&"Books"));
    let mut sorted = tags.clone();
    sorted.sort();
    assert_eq!(tags, sorted);
}

/// Test: counts only include the caller's items
#[tokio::test]
async fn test_tag_count_per_user() {
    let server = create_test_server();
    let alice = create_user(&server, "alice", "hunter22").await;
    let bob = create_user(&server, "bob", "hunter22").await;

    create_item(&server, &alice, json!({ "name": "Shirt", "tags": ["Clothing"] })).await;
    create_item(&server, &alice, json!({ "name": "Scarf", "tags": ["Clothing"] })).await;
    create_item(&server, &bob, json!({ "name": "Hat", "tags": ["Clothing"] })).await;

    let body: Value = server
        .get("/api/tags/Clothing/count")
        .add_cookie(session(&alice))
        .await
        .json();
    assert_eq!(body["tag"], "Clothing");
    assert_eq!(body["count"], 2);

    let body: Value = server
        .get("/api/tags/Unused/count")
        .add_cookie(session(&bob))
        .await
        .json();
    assert_eq!(body["count"], 0);
}

/// Test: recommendations fall back to the catch-all entry
#[tokio::test]
async fn test_recommendation_fallback() {
    let server = create_test_server();

    let books: Value = server.get("/api/recs/Books").await.json();
    assert_eq!(books["tag"], "Books");

    let misc: Value = server.get("/api/recs/Miscellaneous").await.json();
    let unknown: Value = server.get("/api/recs/Snowglobes").await.json();
    assert_eq!(unknown["tag"], "Snowglobes");
    assert_eq!(unknown["text"], misc["text"]);
    assert_ne!(books["text"], misc["text"]);
}
