// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{
    mount_llm_entries, mount_page, mount_slow_page, page_url, poll_until_terminal, test_app,
};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_generation_run_produces_llms_txt() {
    let site = MockServer::start().await;
    mount_page(
        &site,
        "/",
        r#"<html><head><title>Acme Platform</title></head>
           <body><p>Acme builds workflow automation for small teams.</p>
           <a href="/docs">Docs</a><a href="/privacy">Privacy</a></body></html>"#,
    )
    .await;
    mount_page(
        &site,
        "/docs",
        "<html><head><title>Acme Docs</title></head><body><p>Developer documentation for the Acme API.</p></body></html>",
    )
    .await;
    mount_page(
        &site,
        "/privacy",
        "<html><head><title>Privacy</title></head><body><p>How Acme handles personal data.</p></body></html>",
    )
    .await;

    let llm = MockServer::start().await;
    mount_llm_entries(
        &llm,
        json!([
            {"url": page_url(&site, "/"), "section": "docs", "title": "Acme Platform", "description": "Workflow automation for small teams."},
            {"url": page_url(&site, "/docs"), "section": "docs", "title": "Acme Docs", "description": "Developer documentation for the Acme API."},
            {"url": page_url(&site, "/privacy"), "section": "policies", "title": "Privacy Policy", "description": "How Acme handles personal data."}
        ]),
    )
    .await;

    let app = test_app(&llm.uri());
    let response = app
        .server
        .post("/v1/generate")
        .json(&json!({"siteUrl": site.uri(), "strictMode": true}))
        .await;
    assert_eq!(response.status_code(), 202);
    let started: Value = response.json();
    let run_id = started["runId"].as_str().unwrap().to_string();

    let status = poll_until_terminal(&app.server, &run_id).await;
    assert_eq!(status["status"], "completed", "status: {:?}", status);
    assert_eq!(status["stage"], "done");
    assert_eq!(status["progress"], 100);

    let result = app
        .server
        .get(&format!("/v1/generate/result?runId={}", run_id))
        .await;
    assert_eq!(result.status_code(), 200);
    let result: Value = result.json();
    let content = result["content"].as_str().unwrap();

    assert!(content.starts_with("# Acme Platform\n"));
    assert!(content.contains("> Workflow automation for small teams."));
    assert!(content.contains("## Docs"));
    assert!(content.contains("## Policies"));
    assert!(content.contains(&format!(
        "- [Acme Docs]({}): Developer documentation for the Acme API.",
        page_url(&site, "/docs")
    )));
    assert!(!content.contains("## Optional"));
}

#[tokio::test]
async fn test_result_by_site_url_lookup() {
    let site = MockServer::start().await;
    mount_page(
        &site,
        "/",
        "<html><head><title>Solo</title></head><body><p>One page only, nothing linked.</p></body></html>",
    )
    .await;

    let llm = MockServer::start().await;
    mount_llm_entries(
        &llm,
        json!([
            {"url": page_url(&site, "/"), "section": "docs", "title": "Solo", "description": "A single page site."}
        ]),
    )
    .await;

    let app = test_app(&llm.uri());
    let response = app
        .server
        .post("/v1/generate")
        .json(&json!({"siteUrl": site.uri(), "maxPages": 1, "includeOptional": false}))
        .await;
    let started: Value = response.json();
    let run_id = started["runId"].as_str().unwrap().to_string();
    poll_until_terminal(&app.server, &run_id).await;

    // 用站点URL而不是运行ID查询
    let result = app
        .server
        .get(&format!("/v1/generate/result?siteUrl={}", site.uri()))
        .await;
    assert_eq!(result.status_code(), 200);
    let result: Value = result.json();
    let content = result["content"].as_str().unwrap();
    assert!(content.contains("## Docs"));
    assert!(!content.contains("## Optional"));
}

#[tokio::test]
async fn test_all_fetch_failures_end_in_no_content_error() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;

    let llm = MockServer::start().await;
    let app = test_app(&llm.uri());

    let response = app
        .server
        .post("/v1/generate")
        .json(&json!({"siteUrl": site.uri()}))
        .await;
    let started: Value = response.json();
    let run_id = started["runId"].as_str().unwrap().to_string();

    let status = poll_until_terminal(&app.server, &run_id).await;
    assert_eq!(status["status"], "error");
    assert_eq!(status["stage"], "error");
    assert_eq!(status["errorMessage"], "NoContentDiscovered");

    let result = app
        .server
        .get(&format!("/v1/generate/result?runId={}", run_id))
        .await;
    assert_eq!(result.status_code(), 409);
}

#[tokio::test]
async fn test_page_level_summarizer_failure_degrades_to_fallback_entry() {
    let site = MockServer::start().await;
    mount_page(
        &site,
        "/",
        r#"<html><head><title>Acme</title></head><body><p>Acme home page content.</p>
           <a href="/a">A</a><a href="/b">B</a></body></html>"#,
    )
    .await;
    mount_page(
        &site,
        "/a",
        "<html><head><title>Alpha Feature</title></head><body><p>Details about alpha.</p></body></html>",
    )
    .await;
    mount_page(
        &site,
        "/b",
        "<html><head><title>Beta Feature</title></head><body><p>Details about beta.</p></body></html>",
    )
    .await;

    // 模型只应答了三个页面中的两个，缺失的页面降级为标题条目
    let llm = MockServer::start().await;
    mount_llm_entries(
        &llm,
        json!([
            {"url": page_url(&site, "/"), "section": "docs", "title": "Acme", "description": "Home."},
            {"url": page_url(&site, "/b"), "section": "docs", "title": "Beta Feature", "description": "Details about beta."}
        ]),
    )
    .await;

    let app = test_app(&llm.uri());
    let response = app
        .server
        .post("/v1/generate")
        .json(&json!({"siteUrl": site.uri(), "strictMode": false}))
        .await;
    let started: Value = response.json();
    let run_id = started["runId"].as_str().unwrap().to_string();

    let status = poll_until_terminal(&app.server, &run_id).await;
    assert_eq!(status["status"], "completed", "status: {:?}", status);

    let result = app
        .server
        .get(&format!("/v1/generate/result?runId={}", run_id))
        .await;
    let result: Value = result.json();
    let content = result["content"].as_str().unwrap();

    // 两个完整条目加一个使用页面自身标题的降级条目
    assert!(content.contains("- [Acme]"));
    assert!(content.contains("- [Beta Feature]"));
    assert!(content.contains(&format!("- [Alpha Feature]({}):", page_url(&site, "/a"))));
}

#[tokio::test]
async fn test_second_start_for_same_site_is_rejected_while_running() {
    let site = MockServer::start().await;
    // 首页延迟应答，保证第一个运行停留在discover阶段
    mount_slow_page(
        &site,
        "/",
        "<html><head><title>Slow</title></head><body><p>Slow page body text.</p></body></html>",
        Duration::from_millis(1500),
    )
    .await;

    let llm = MockServer::start().await;
    mount_llm_entries(
        &llm,
        json!([
            {"url": page_url(&site, "/"), "section": "docs", "title": "Slow", "description": "A slow page."}
        ]),
    )
    .await;

    let app = test_app(&llm.uri());
    let first = app
        .server
        .post("/v1/generate")
        .json(&json!({"siteUrl": site.uri()}))
        .await;
    assert_eq!(first.status_code(), 202);
    let started: Value = first.json();
    let run_id = started["runId"].as_str().unwrap().to_string();

    let second = app
        .server
        .post("/v1/generate")
        .json(&json!({"siteUrl": site.uri()}))
        .await;
    assert_eq!(second.status_code(), 409);

    // 第一个运行结束后同一站点可以重新开始
    poll_until_terminal(&app.server, &run_id).await;
    let third = app
        .server
        .post("/v1/generate")
        .json(&json!({"siteUrl": site.uri()}))
        .await;
    assert_eq!(third.status_code(), 202);
}

#[tokio::test]
async fn test_cancelled_run_ends_in_error_state() {
    let site = MockServer::start().await;
    mount_slow_page(
        &site,
        "/",
        "<html><body><p>body</p></body></html>",
        Duration::from_millis(1500),
    )
    .await;

    let llm = MockServer::start().await;
    let app = test_app(&llm.uri());

    let response = app
        .server
        .post("/v1/generate")
        .json(&json!({"siteUrl": site.uri()}))
        .await;
    let started: Value = response.json();
    let run_id = started["runId"].as_str().unwrap().to_string();

    let cancel = app
        .server
        .delete(&format!("/v1/generate/{}", run_id))
        .await;
    assert_eq!(cancel.status_code(), 204);

    let status = poll_until_terminal(&app.server, &run_id).await;
    assert_eq!(status["status"], "error");
    assert_eq!(status["errorMessage"], "Cancelled");
}
