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

use crate::{
    application::dto::{
        generate_request::GenerateRequestDto,
        generate_response::{ResultResponseDto, RunQueryDto, StartResponseDto, StatusResponseDto},
    },
    domain::{
        models::run::{Run, RunStatus},
        repositories::run_repository::{RepositoryError, RunRepository},
    },
    domain::services::llm_service::SummarizerTrait,
    engines::traits::FetchEngine,
    infrastructure::run_registry::{RegistryError, RunHandle, RunRegistry},
    utils::url_utils,
    workers::pipeline_worker::PipelineWorker,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use url::Url;
use uuid::Uuid;
use validator::Validate;

#[derive(Error, Debug)]
pub enum GenerateUseCaseError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("A run is already in progress for this site")]
    AlreadyRunning,
    #[error("Run not found")]
    NotFound,
    #[error("Run is not completed yet")]
    NotReady,
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 生成用例
///
/// 面向调用方的运行协调操作：启动、状态查询、结果获取
/// 和取消。start在初始化运行状态后立即返回，流水线在
/// 后台任务中推进。
pub struct GenerateUseCase<E, S, R>
where
    E: FetchEngine,
    S: SummarizerTrait,
    R: RunRepository,
{
    worker: Arc<PipelineWorker<E, S, R>>,
    repository: Arc<R>,
    registry: Arc<RunRegistry>,
    default_max_pages: u32,
}

impl<E, S, R> GenerateUseCase<E, S, R>
where
    E: FetchEngine + Send + Sync + 'static,
    S: SummarizerTrait + 'static,
    R: RunRepository + 'static,
{
    pub fn new(
        worker: Arc<PipelineWorker<E, S, R>>,
        repository: Arc<R>,
        registry: Arc<RunRegistry>,
        default_max_pages: u32,
    ) -> Self {
        Self {
            worker,
            repository,
            registry,
            default_max_pages,
        }
    }

    /// 启动一次生成运行
    ///
    /// 站点键已有进行中的运行时返回AlreadyRunning。运行记录
    /// 初始化完成后立即返回，不等待流水线。
    pub async fn start(
        &self,
        dto: GenerateRequestDto,
    ) -> Result<StartResponseDto, GenerateUseCaseError> {
        dto.validate()
            .map_err(|e| GenerateUseCaseError::ValidationError(e.to_string()))?;

        let seed = Url::parse(&dto.site_url)
            .map_err(|e| GenerateUseCaseError::ValidationError(format!("invalid site url: {}", e)))?;
        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(GenerateUseCaseError::ValidationError(
                "site url must use http or https".to_string(),
            ));
        }
        let site_key = url_utils::site_key(&seed);

        let settings = dto.to_settings(self.default_max_pages);
        let run = Run::new(site_key, dto.site_url.clone(), settings.clone());
        let run_id = run.id;

        let handle = self.registry.try_register(run).map_err(|e| match e {
            RegistryError::AlreadyRunning => GenerateUseCaseError::AlreadyRunning,
        })?;

        if let Err(e) = self
            .repository
            .record_run_start(run_id, &dto.site_url, &settings)
            .await
        {
            let site_key = handle.run.read().site_key.clone();
            handle.run.write().fail(format!("run start not recorded: {}", e));
            self.registry.release(&site_key, run_id);
            return Err(e.into());
        }

        info!("Run {} started for {}", run_id, dto.site_url);

        let worker = self.worker.clone();
        tokio::spawn(async move {
            worker.run(handle).await;
        });

        Ok(StartResponseDto {
            run_id,
            site_url: dto.site_url,
        })
    }

    /// 查询运行状态
    ///
    /// 纯读取，不会阻塞在流水线工作上。
    pub fn status(&self, query: &RunQueryDto) -> Result<StatusResponseDto, GenerateUseCaseError> {
        let handle = self.resolve(query)?;
        let run = handle.run.read();
        Ok(StatusResponseDto::from(&*run))
    }

    /// 获取生成结果
    ///
    /// 运行未完成时返回NotReady，未知键返回NotFound。
    pub async fn result(
        &self,
        query: &RunQueryDto,
    ) -> Result<ResultResponseDto, GenerateUseCaseError> {
        let handle = self.resolve(query)?;
        let (run_id, site_url, status) = {
            let run = handle.run.read();
            (run.id, run.site_url.clone(), run.status)
        };

        if status != RunStatus::Completed {
            return Err(GenerateUseCaseError::NotReady);
        }

        let artifact = self
            .repository
            .find_artifact(run_id)
            .await?
            .ok_or(GenerateUseCaseError::NotFound)?;

        Ok(ResultResponseDto {
            run_id,
            site_url,
            content: artifact.content,
            created_at: artifact.created_at,
        })
    }

    /// 取消一次运行
    ///
    /// 标志在阶段边界被流水线观察到；已进入终态的运行不受影响。
    pub fn cancel(&self, run_id: Uuid) -> Result<(), GenerateUseCaseError> {
        let handle = self
            .registry
            .get_by_id(run_id)
            .ok_or(GenerateUseCaseError::NotFound)?;
        handle.cancel();
        Ok(())
    }

    /// 按运行ID或站点URL解析运行句柄
    fn resolve(&self, query: &RunQueryDto) -> Result<RunHandle, GenerateUseCaseError> {
        if let Some(run_id) = query.run_id {
            return self
                .registry
                .get_by_id(run_id)
                .ok_or(GenerateUseCaseError::NotFound);
        }
        if let Some(site_url) = &query.site_url {
            let url = Url::parse(site_url).map_err(|e| {
                GenerateUseCaseError::ValidationError(format!("invalid site url: {}", e))
            })?;
            return self
                .registry
                .get_by_site(&url_utils::site_key(&url))
                .ok_or(GenerateUseCaseError::NotFound);
        }
        Err(GenerateUseCaseError::ValidationError(
            "either runId or siteUrl is required".to_string(),
        ))
    }
}
