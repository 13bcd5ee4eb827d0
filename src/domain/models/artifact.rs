// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 生成产物
///
/// 成功运行的最终输出，每次运行恰好创建一次，创建后不可变，
/// 由持久化协作方保管。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// 所属运行ID
    pub run_id: Uuid,
    /// 产物类型
    pub kind: ArtifactKind,
    /// 文档内容
    pub content: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(run_id: Uuid, kind: ArtifactKind, content: String) -> Self {
        Self {
            run_id,
            kind,
            content,
            created_at: Utc::now(),
        }
    }
}

/// 产物类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// llms.txt文档
    #[default]
    LlmsTxt,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArtifactKind::LlmsTxt => write!(f, "llms_txt"),
        }
    }
}
