mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

async fn with_items(count: u32) -> TestApp {
    let app = TestApp::new().await;
    app.create_schema(json!({
        "name": "items",
        "resourceName": "items",
        "schema": {"seq|+1": 1, "label": "item-@natural(1,9)", "active|1": true},
        "count": count
    }))
    .await;
    app
}

#[tokio::test]
async fn served_immediately_after_create() {
    let app = with_items(25).await;
    let resp = app.get("/mock/items").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["code"], 200);
    assert_eq!(resp.body["message"], "fetch succeeded");
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 25);
    assert!(resp.body.get("pagination").is_none());
    assert!(resp.body["timestamp"].is_string());
}

#[tokio::test]
async fn page_aliases_produce_pagination_block() {
    let app = with_items(25).await;
    let resp = app.get("/mock/items?page=3&pageSize=10").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.headers["x-total-count"], "25");
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 5);
    assert_eq!(
        resp.body["pagination"],
        json!({"page": 3, "limit": 10, "total": 25, "totalPages": 3, "hasNext": false, "hasPrev": true})
    );
    assert_eq!(resp.body["data"][0]["seq"], 21);
}

#[tokio::test]
async fn pagination_block_agrees_with_data() {
    let app = with_items(25).await;
    let resp = app.get("/mock/items?_limit=5&_limit=2").await;
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(resp.body["pagination"]["limit"], 2);
    assert_eq!(resp.body["pagination"]["totalPages"], 13);

    let resp = app.get("/mock/items?pageSize=&_limit=3").await;
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 3);
    assert_eq!(resp.body["pagination"]["limit"], 3);
    assert_eq!(resp.body["pagination"]["total"], 25);
}

#[tokio::test]
async fn filters_sort_and_slices() {
    let app = with_items(10).await;
    let resp = app.get("/mock/items?seq_gte=4&seq_lte=6&_sort=seq&_order=desc").await;
    let seqs: Vec<i64> = resp.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["seq"].as_i64().unwrap())
        .collect();
    assert_eq!(seqs, vec![6, 5, 4]);

    let resp = app.get("/mock/items?seq=2&seq=9").await;
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 2);

    let resp = app.get("/mock/items?_start=2&_end=5").await;
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 3);
    assert_eq!(resp.headers["x-total-count"], "10");

    let bad = app.get("/mock/items?label_like=(").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn record_crud() {
    let app = with_items(3).await;
    let first = app.get("/mock/items").await.body["data"][0].clone();
    let id = first["id"].as_str().unwrap().to_string();

    let one = app.get(&format!("/mock/items/{id}")).await;
    assert_eq!(one.body["data"], first);

    let created = app.post("/mock/items", json!({"label": "new"})).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["code"], 201);
    assert_eq!(created.body["message"], "create succeeded");
    let new_id = created.body["data"]["id"].as_str().unwrap().to_string();

    let dup = app.post("/mock/items", json!({"id": new_id})).await;
    assert_eq!(dup.status, StatusCode::BAD_REQUEST);

    let patched = app.patch(&format!("/mock/items/{id}"), json!({"label": "patched"})).await;
    assert_eq!(patched.body["message"], "update succeeded");
    assert_eq!(patched.body["data"]["label"], "patched");
    assert_eq!(patched.body["data"]["seq"], first["seq"]);

    let replaced = app.put(&format!("/mock/items/{id}"), json!({"only": 1})).await;
    assert_eq!(replaced.body["data"], json!({"id": id, "only": 1}));

    let removed = app.delete(&format!("/mock/items/{new_id}")).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["message"], "delete succeeded");
    assert_eq!(removed.body["data"]["label"], "new");

    let missing = app.get(&format!("/mock/items/{new_id}")).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(missing.body["error"].is_string());
    assert_eq!(app.get("/mock/items").await.body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn record_changes_show_in_schema_data() {
    let app = with_items(2).await;
    let id = app.get("/api/schemas").await.body[0]["id"].as_str().unwrap().to_string();
    app.post("/mock/items", json!({"label": "extra"})).await;
    let data = app.get(&format!("/api/schemas/{id}/data")).await;
    assert_eq!(data.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn unknown_resource_and_routes() {
    let app = TestApp::new().await;
    let resp = app.get("/mock/ghosts").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body["error"].as_str().unwrap().contains("ghosts"));

    let resp = app.get("/nowhere/at/all").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body, json!({"error": "not found"}));
}

#[tokio::test]
async fn non_object_body_is_rejected() {
    let app = with_items(1).await;
    let resp = app.post("/mock/items", json!([1, 2])).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["error"].is_string());
}

#[tokio::test]
async fn custom_mock_base() {
    let app = TestApp::with(|s| s.mock_base = "/fake".into()).await;
    let created = app
        .post("/api/schemas", json!({"name": "a", "resourceName": "books", "schema": {"t": "@title"}, "count": 2}))
        .await;
    assert_eq!(created.body["endpoint"], "/fake/books");
    assert_eq!(app.get("/fake/books").await.status, StatusCode::OK);
    assert_eq!(app.get("/mock/books").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ops_routes() {
    let app = TestApp::new().await;
    assert_eq!(app.get("/health").await.body, json!({"status": "ok"}));
    let ready = app.get("/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["resources"], 0);
    let version = app.get("/version").await;
    assert_eq!(version.body["name"], "mock-generator");

    tokio::fs::remove_file(&app.state.settings.db_path).await.unwrap();
    assert_eq!(app.get("/ready").await.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = TestApp::with(|s| s.body_limit = 64).await;
    let big = "x".repeat(256);
    let resp = app
        .post("/api/schemas", json!({"name": big, "resourceName": "a", "schema": {}, "count": 1}))
        .await;
    assert_eq!(resp.status, StatusCode::PAYLOAD_TOO_LARGE);
}
