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

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{
        dto::{generate_request::GenerateRequestDto, generate_response::RunQueryDto},
        use_cases::generate_use_case::{GenerateUseCase, GenerateUseCaseError},
    },
    config::settings::Settings,
    domain::repositories::run_repository::RunRepository,
    domain::services::llm_service::SummarizerTrait,
    engines::traits::FetchEngine,
    infrastructure::run_registry::RunRegistry,
    workers::pipeline_worker::PipelineWorker,
};

/// 启动llms.txt生成运行
pub async fn start_generation<E, S, R>(
    Extension(worker): Extension<Arc<PipelineWorker<E, S, R>>>,
    Extension(repository): Extension<Arc<R>>,
    Extension(registry): Extension<Arc<RunRegistry>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(payload): Json<GenerateRequestDto>,
) -> impl IntoResponse
where
    E: FetchEngine + Send + Sync + 'static,
    S: SummarizerTrait + 'static,
    R: RunRepository + 'static,
{
    let use_case = GenerateUseCase::new(
        worker,
        repository,
        registry,
        settings.crawler.default_max_pages,
    );
    match use_case.start(payload).await {
        Ok(response) => (StatusCode::ACCEPTED, Json(response)).into_response(),
        Err(e) => {
            let (status, msg): (StatusCode, String) = e.into();
            (status, Json(json!({ "error": msg }))).into_response()
        }
    }
}

/// 查询运行状态
pub async fn get_status<E, S, R>(
    Extension(worker): Extension<Arc<PipelineWorker<E, S, R>>>,
    Extension(repository): Extension<Arc<R>>,
    Extension(registry): Extension<Arc<RunRegistry>>,
    Extension(settings): Extension<Arc<Settings>>,
    Query(query): Query<RunQueryDto>,
) -> impl IntoResponse
where
    E: FetchEngine + Send + Sync + 'static,
    S: SummarizerTrait + 'static,
    R: RunRepository + 'static,
{
    let use_case = GenerateUseCase::new(
        worker,
        repository,
        registry,
        settings.crawler.default_max_pages,
    );
    match use_case.status(&query) {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => {
            let (status, msg): (StatusCode, String) = e.into();
            (status, Json(json!({ "error": msg }))).into_response()
        }
    }
}

/// 获取生成结果
pub async fn get_result<E, S, R>(
    Extension(worker): Extension<Arc<PipelineWorker<E, S, R>>>,
    Extension(repository): Extension<Arc<R>>,
    Extension(registry): Extension<Arc<RunRegistry>>,
    Extension(settings): Extension<Arc<Settings>>,
    Query(query): Query<RunQueryDto>,
) -> impl IntoResponse
where
    E: FetchEngine + Send + Sync + 'static,
    S: SummarizerTrait + 'static,
    R: RunRepository + 'static,
{
    let use_case = GenerateUseCase::new(
        worker,
        repository,
        registry,
        settings.crawler.default_max_pages,
    );
    match use_case.result(&query).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            let (status, msg): (StatusCode, String) = e.into();
            (status, Json(json!({ "error": msg }))).into_response()
        }
    }
}

/// 取消进行中的生成运行
pub async fn cancel_generation<E, S, R>(
    Extension(worker): Extension<Arc<PipelineWorker<E, S, R>>>,
    Extension(repository): Extension<Arc<R>>,
    Extension(registry): Extension<Arc<RunRegistry>>,
    Extension(settings): Extension<Arc<Settings>>,
    Path(run_id): Path<Uuid>,
) -> impl IntoResponse
where
    E: FetchEngine + Send + Sync + 'static,
    S: SummarizerTrait + 'static,
    R: RunRepository + 'static,
{
    let use_case = GenerateUseCase::new(
        worker,
        repository,
        registry,
        settings.crawler.default_max_pages,
    );
    match use_case.cancel(run_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            let (status, msg): (StatusCode, String) = e.into();
            (status, Json(json!({ "error": msg }))).into_response()
        }
    }
}

impl From<GenerateUseCaseError> for (StatusCode, String) {
    fn from(err: GenerateUseCaseError) -> Self {
        match err {
            GenerateUseCaseError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            GenerateUseCaseError::AlreadyRunning => (
                StatusCode::CONFLICT,
                "A run is already in progress for this site".to_string(),
            ),
            GenerateUseCaseError::NotFound => (StatusCode::NOT_FOUND, "Run not found".to_string()),
            GenerateUseCaseError::NotReady => (
                StatusCode::CONFLICT,
                "Run is not completed yet".to_string(),
            ),
            GenerateUseCaseError::Repository(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}
