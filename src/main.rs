// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Extension;
use llogen::config::settings::Settings;
use llogen::domain::services::crawl_service::CrawlService;
use llogen::domain::services::llm_service::LlmService;
use llogen::engines::reqwest_engine::ReqwestEngine;
use llogen::infrastructure::repositories::memory_run_repo::MemoryRunRepository;
use llogen::infrastructure::run_registry::RunRegistry;
use llogen::presentation::routes;
use llogen::utils::telemetry;
use llogen::workers::pipeline_worker::PipelineWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting llogen...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Initialize components
    let repository = Arc::new(MemoryRunRepository::new());
    let registry = Arc::new(RunRegistry::new());

    let crawl_service = CrawlService::new(
        Arc::new(ReqwestEngine),
        settings.crawler.fetch_concurrency,
        Duration::from_secs(settings.crawler.fetch_timeout_secs),
        settings.crawler.max_body_bytes,
    );
    let summarizer = Arc::new(LlmService::new(&settings.llm));
    if settings.llm.api_key.is_none() {
        tracing::warn!("LLM API key not configured; summarize stage will fail");
    }

    let worker = Arc::new(PipelineWorker::new(
        crawl_service,
        summarizer,
        repository.clone(),
        registry.clone(),
    ));

    // 4. Start HTTP server
    let app = routes::routes()
        .layer(Extension(worker))
        .layer(Extension(repository))
        .layer(Extension(registry))
        .layer(Extension(settings.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
