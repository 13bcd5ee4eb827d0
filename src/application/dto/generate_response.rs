// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::run::{Run, RunStage, RunStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 运行启动响应DTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponseDto {
    pub run_id: Uuid,
    pub site_url: String,
}

/// 运行状态响应DTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponseDto {
    pub run_id: Uuid,
    pub stage: RunStage,
    pub status: RunStatus,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&Run> for StatusResponseDto {
    fn from(run: &Run) -> Self {
        Self {
            run_id: run.id,
            stage: run.stage,
            status: run.status,
            progress: run.progress,
            message: run.message.clone(),
            error_message: run.error_message.clone(),
        }
    }
}

/// 生成结果响应DTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponseDto {
    pub run_id: Uuid,
    pub site_url: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// 状态/结果查询参数
///
/// 按运行ID或站点URL二选一查询。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryDto {
    pub run_id: Option<Uuid>,
    pub site_url: Option<String>,
}
