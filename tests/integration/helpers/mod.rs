// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::Extension;
use axum_test::TestServer;
use llogen::config::settings::{CrawlerSettings, LlmSettings, ServerSettings, Settings};
use llogen::domain::services::crawl_service::CrawlService;
use llogen::domain::services::llm_service::LlmService;
use llogen::engines::reqwest_engine::ReqwestEngine;
use llogen::infrastructure::repositories::memory_run_repo::MemoryRunRepository;
use llogen::infrastructure::run_registry::RunRegistry;
use llogen::presentation::routes;
use llogen::workers::pipeline_worker::PipelineWorker;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 测试应用
pub struct TestApp {
    pub server: TestServer,
}

/// 构建指向给定LLM地址的完整测试应用
pub fn test_app(llm_base_url: &str) -> TestApp {
    let settings = Arc::new(Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        crawler: CrawlerSettings {
            fetch_concurrency: 4,
            fetch_timeout_secs: 5,
            max_body_bytes: 1024 * 1024,
            default_max_pages: 50,
        },
        llm: LlmSettings {
            api_key: Some("test-key".to_string()),
            model: "test-model".to_string(),
            api_base_url: llm_base_url.to_string(),
            max_batch_chars: 100_000,
            page_text_limit: 10_000,
            requests_per_minute: 600,
        },
    });

    let repository = Arc::new(MemoryRunRepository::new());
    let registry = Arc::new(RunRegistry::new());
    let crawl_service = CrawlService::new(
        Arc::new(ReqwestEngine),
        settings.crawler.fetch_concurrency,
        Duration::from_secs(settings.crawler.fetch_timeout_secs),
        settings.crawler.max_body_bytes,
    );
    let summarizer = Arc::new(LlmService::new(&settings.llm));
    let worker = Arc::new(PipelineWorker::new(
        crawl_service,
        summarizer,
        repository.clone(),
        registry.clone(),
    ));

    let app = routes::routes()
        .layer(Extension(worker))
        .layer(Extension(repository))
        .layer(Extension(registry))
        .layer(Extension(settings));

    TestApp {
        server: TestServer::new(app).expect("test server"),
    }
}

/// 挂载一个返回HTML页面的站点路由
pub async fn mount_page(site: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html.to_string().into_bytes(), "text/html; charset=utf-8"),
        )
        .mount(site)
        .await;
}

/// 挂载延迟应答的站点首页，用于保持运行处于discover阶段
pub async fn mount_slow_page(site: &MockServer, route: &str, html: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html.to_string().into_bytes(), "text/html; charset=utf-8")
                .set_delay(delay),
        )
        .mount(site)
        .await;
}

/// 挂载返回固定条目数组的chat completions端点
pub async fn mount_llm_entries(llm: &MockServer, entries: Value) {
    let body = json!({
        "choices": [
            {"message": {"role": "assistant", "content": entries.to_string()}}
        ]
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(llm)
        .await;
}

/// 轮询状态直到运行进入终态
///
/// 外部调用方只能看到stage单调推进到done或error。
pub async fn poll_until_terminal(server: &TestServer, run_id: &str) -> Value {
    for _ in 0..100 {
        let response = server
            .get(&format!("/v1/generate/status?runId={}", run_id))
            .await;
        let status: Value = response.json();
        let state = status["status"].as_str().unwrap_or_default().to_string();
        if state == "completed" || state == "error" {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("run {} did not reach a terminal state in time", run_id);
}

/// 站点根URL对应的规范化页面URL
pub fn page_url(site: &MockServer, route: &str) -> String {
    if route == "/" {
        format!("{}/", site.uri())
    } else {
        format!("{}{}", site.uri(), route)
    }
}
