// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::test_app;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::MockServer;

#[tokio::test]
async fn test_health_and_version_endpoints() {
    let llm = MockServer::start().await;
    let app = test_app(&llm.uri());

    let health = app.server.get("/health").await;
    assert_eq!(health.status_code(), 200);
    assert_eq!(health.text(), "OK");

    let version = app.server.get("/v1/version").await;
    assert_eq!(version.status_code(), 200);
    assert!(!version.text().is_empty());
}

#[tokio::test]
async fn test_start_rejects_invalid_site_url() {
    let llm = MockServer::start().await;
    let app = test_app(&llm.uri());

    let response = app
        .server
        .post("/v1/generate")
        .json(&json!({"siteUrl": "not-a-url"}))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_start_rejects_out_of_range_max_pages() {
    let llm = MockServer::start().await;
    let app = test_app(&llm.uri());

    let response = app
        .server
        .post("/v1/generate")
        .json(&json!({"siteUrl": "https://example.com", "maxPages": 0}))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_status_of_unknown_run_is_not_found() {
    let llm = MockServer::start().await;
    let app = test_app(&llm.uri());

    let response = app
        .server
        .get(&format!("/v1/generate/status?runId={}", Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), 404);

    let by_site = app
        .server
        .get("/v1/generate/status?siteUrl=https://unknown.example")
        .await;
    assert_eq!(by_site.status_code(), 404);
}

#[tokio::test]
async fn test_status_requires_a_query_key() {
    let llm = MockServer::start().await;
    let app = test_app(&llm.uri());

    let response = app.server.get("/v1/generate/status").await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_cancel_unknown_run_is_not_found() {
    let llm = MockServer::start().await;
    let app = test_app(&llm.uri());

    let response = app
        .server
        .delete(&format!("/v1/generate/{}", Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), 404);
}
