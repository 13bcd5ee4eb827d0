// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::llm_service::LlmService;
use crate::engines::reqwest_engine::ReqwestEngine;
use crate::infrastructure::repositories::memory_run_repo::MemoryRunRepository;
use crate::presentation::handlers::generate_handler;
use axum::{
    routing::{delete, get, post},
    Router,
};

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let generate_routes = Router::new()
        .route(
            "/v1/generate",
            post(generate_handler::start_generation::<ReqwestEngine, LlmService, MemoryRunRepository>),
        )
        .route(
            "/v1/generate/status",
            get(generate_handler::get_status::<ReqwestEngine, LlmService, MemoryRunRepository>),
        )
        .route(
            "/v1/generate/result",
            get(generate_handler::get_result::<ReqwestEngine, LlmService, MemoryRunRepository>),
        )
        .route(
            "/v1/generate/{run_id}",
            delete(
                generate_handler::cancel_generation::<ReqwestEngine, LlmService, MemoryRunRepository>,
            ),
        );

    Router::new().merge(public_routes).merge(generate_routes)
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
