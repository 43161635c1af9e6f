mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use std::collections::HashSet;

fn users(count: u32) -> serde_json::Value {
    json!({
        "name": "users",
        "resourceName": "users",
        "schema": {"name": "@cname", "age": [{"x": 1}]},
        "count": count
    })
}

#[tokio::test]
async fn create_get_data_round_trip() {
    let app = TestApp::new().await;
    let created = app.post("/api/schemas", users(5)).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["endpoint"], "/mock/users");
    assert_eq!(created.body["count"], 5);
    let id = created.body["id"].as_str().unwrap();
    assert!(id.starts_with("schema_"));

    let fetched = app.get(&format!("/api/schemas/{id}")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, created.body);
    let again = app.get(&format!("/api/schemas/{id}")).await;
    assert_eq!(again.body, fetched.body);

    let data = app.get(&format!("/api/schemas/{id}/data")).await;
    let records = data.body.as_array().unwrap();
    assert_eq!(records.len(), 5);
    let ids: HashSet<&str> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids.len(), 5);
    for r in records {
        let keys: Vec<&str> = r.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name", "age"]);
        assert!(r["name"].is_string());
        assert_eq!(r["age"], json!([{"x": 1}]));
    }
}

#[tokio::test]
async fn validation_failures_are_400() {
    let app = TestApp::new().await;
    for body in [
        json!({"resourceName": "a", "schema": {}, "count": 1}),
        json!({"name": "a", "resourceName": "a", "schema": {}, "count": 0}),
        json!({"name": "a", "resourceName": "a/b", "schema": {}, "count": 1}),
        json!({"name": "a", "resourceName": "a", "schema": {}, "count": 5000}),
    ] {
        let resp = app.post("/api/schemas", body).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert!(resp.body["error"].is_string());
    }

    let resp = app.send(axum::http::Method::POST, "/api/schemas", None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn count_bound_follows_settings() {
    let app = TestApp::with(|s| s.max_record_count = 3).await;
    let resp = app.post("/api/schemas", users(4)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.post("/api/schemas", users(3)).await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
    let app = TestApp::new().await;
    app.create_schema(users(1)).await;
    let dup = app.post("/api/schemas", users(2)).await;
    assert_eq!(dup.status, StatusCode::BAD_REQUEST);
    assert!(dup.body["error"].as_str().unwrap().contains("users"));
    let list = app.get("/api/schemas").await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn list_pagination() {
    let app = TestApp::new().await;
    for i in 0..12 {
        app.create_schema(json!({"name": format!("s{i}"), "resourceName": format!("r{i}"), "schema": {"v": "@word"}, "count": 1}))
            .await;
    }
    let all = app.get("/api/schemas").await;
    assert_eq!(all.body.as_array().unwrap().len(), 12);
    assert!(all.body[0]["endpoint"].is_string());

    let page = app.get("/api/schemas?page=2").await;
    assert_eq!(page.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(
        page.body["pagination"],
        json!({"total": 12, "page": 2, "pageSize": 10, "totalPages": 2})
    );

    let sized = app.get("/api/schemas?pageSize=5&page=3").await;
    assert_eq!(sized.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(sized.body["data"][0]["name"], "s10");
}

#[tokio::test]
async fn data_pagination_past_the_end_is_empty() {
    let app = TestApp::new().await;
    let id = app.create_schema(users(7)).await;
    let page = app.get(&format!("/api/schemas/{id}/data?page=2&pageSize=5")).await;
    assert_eq!(page.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(page.body["pagination"]["totalPages"], 2);
    let past = app.get(&format!("/api/schemas/{id}/data?page=4&pageSize=5")).await;
    assert_eq!(past.status, StatusCode::OK);
    assert!(past.body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn update_regenerates() {
    let app = TestApp::new().await;
    let id = app.create_schema(users(2)).await;
    let before = app.get(&format!("/api/schemas/{id}")).await.body;

    let updated = app
        .put(
            &format!("/api/schemas/{id}"),
            json!({"name": "people", "resourceName": "people", "schema": {"title": "@title"}, "count": 6}),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["id"], before["id"]);
    assert_eq!(updated.body["createdAt"], before["createdAt"]);
    assert_eq!(updated.body["endpoint"], "/mock/people");

    let data = app.get(&format!("/api/schemas/{id}/data")).await;
    assert_eq!(data.body.as_array().unwrap().len(), 6);
    assert!(data.body[0]["title"].is_string());
    assert_eq!(app.get("/mock/users").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/mock/people").await.status, StatusCode::OK);

    let missing = app.put("/api/schemas/schema_nope", users(1)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_schema_and_resource() {
    let app = TestApp::new().await;
    let id = app.create_schema(users(3)).await;
    assert_eq!(app.get("/mock/users").await.status, StatusCode::OK);

    let deleted = app.delete(&format!("/api/schemas/{id}")).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({"message": "delete succeeded"}));

    assert_eq!(app.get(&format!("/api/schemas/{id}")).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&format!("/api/schemas/{id}/data")).await.status, StatusCode::NOT_FOUND);
    let gone = app.get("/mock/users").await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert!(gone.body["error"].is_string());
    assert_eq!(app.delete(&format!("/api/schemas/{id}")).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn documents_persist_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let settings = mock_generator::Settings::in_dir(dir.path());
    {
        let state = mock_generator::AppState::open(settings.clone()).await.unwrap();
        state
            .schemas
            .create(serde_json::from_value(users(4)).unwrap())
            .await
            .unwrap();
    }
    let state = mock_generator::AppState::open(settings).await.unwrap();
    assert_eq!(state.schemas.store().count().await, 1);
    assert!(state.registry.resolve("users").is_some());
    assert_eq!(state.resources.len("users").await, Some(4));
}
