// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::artifact::{Artifact, ArtifactKind};
use crate::domain::models::run::{GenerationSettings, RunStatus};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 存储错误
    #[error("Storage error: {0}")]
    Storage(String),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 运行仓库特质
///
/// 持久化协作方的边界。核心只依赖这三个写操作的
/// 原子成功或失败，不感知底层存储的模式。
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// 记录运行开始
    async fn record_run_start(
        &self,
        run_id: Uuid,
        site_url: &str,
        settings: &GenerationSettings,
    ) -> Result<(), RepositoryError>;

    /// 记录生成产物，每次运行至多一次
    async fn record_artifact(
        &self,
        run_id: Uuid,
        kind: ArtifactKind,
        content: &str,
    ) -> Result<(), RepositoryError>;

    /// 标记运行结束
    async fn mark_run_finished(
        &self,
        run_id: Uuid,
        status: RunStatus,
    ) -> Result<(), RepositoryError>;

    /// 按运行ID读取产物
    async fn find_artifact(&self, run_id: Uuid) -> Result<Option<Artifact>, RepositoryError>;
}
