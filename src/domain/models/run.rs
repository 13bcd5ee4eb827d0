// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 生成运行实体
///
/// 表示一次llms.txt生成流水线的完整调用，包含站点标识、
/// 生成选项、阶段进度和生命周期时间戳。运行状态只由
/// 该运行的流水线工作器任务修改，外部调用方通过轮询读取。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// 运行唯一标识符
    pub id: Uuid,
    /// 站点键，由种子URL规范化得到，同一时刻至多一个进行中的运行
    pub site_key: String,
    /// 调用方提供的原始站点URL
    pub site_url: String,
    /// 生成选项
    pub settings: GenerationSettings,
    /// 当前阶段，沿固定顺序单调推进
    pub stage: RunStage,
    /// 粗粒度状态，供调用方快速判断
    pub status: RunStatus,
    /// 进度百分比 (0-100)
    pub progress: u8,
    /// 当前步骤的可读描述
    pub message: String,
    /// 错误消息，仅当status为Error时存在
    pub error_message: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 结束时间，进入终态前为空
    pub finished_at: Option<DateTime<Utc>>,
}

/// 生成选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// 页面数硬上限
    pub max_pages: u32,
    /// 输出语言提示
    pub language: Language,
    /// 严格校验模式
    pub strict_mode: bool,
    /// 是否输出Optional分组
    pub include_optional: bool,
    /// 白名单域名，种子主机之外允许的主机
    pub whitelist_domains: Vec<String>,
    /// 用户附加提示，不做解析，原样传给摘要能力
    pub extras: String,
}

/// 输出语言枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// 自动，由摘要能力根据内容推断
    #[default]
    Auto,
    En,
    Es,
    Fr,
    De,
    Pt,
    Ja,
    Zh,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Language::Auto => "auto",
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Pt => "pt",
            Language::Ja => "ja",
            Language::Zh => "zh",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Language::Auto),
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            "de" => Ok(Language::De),
            "pt" => Ok(Language::Pt),
            "ja" => Ok(Language::Ja),
            "zh" => Ok(Language::Zh),
            _ => Err(()),
        }
    }
}

/// 运行阶段枚举
///
/// 阶段沿固定顺序单调推进：
/// Start → Discover → Extract → Summarize → Compose → Validate → Done，
/// Error可从任意非终态阶段进入且为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    /// 已创建，流水线尚未开始
    #[default]
    Start,
    /// 页面发现中
    Discover,
    /// 内容提取中
    Extract,
    /// 摘要生成中
    Summarize,
    /// 文档组装中
    Compose,
    /// 格式校验中
    Validate,
    /// 已完成
    Done,
    /// 出错终态
    Error,
}

impl RunStage {
    /// 阶段在固定顺序中的序号，Error无序号
    fn order_index(&self) -> Option<u8> {
        match self {
            RunStage::Start => Some(0),
            RunStage::Discover => Some(1),
            RunStage::Extract => Some(2),
            RunStage::Summarize => Some(3),
            RunStage::Compose => Some(4),
            RunStage::Validate => Some(5),
            RunStage::Done => Some(6),
            RunStage::Error => None,
        }
    }

    /// 阶段对应的进度百分比
    pub fn progress(&self) -> u8 {
        match self {
            RunStage::Start => 0,
            RunStage::Discover => 10,
            RunStage::Extract => 30,
            RunStage::Summarize => 60,
            RunStage::Compose => 80,
            RunStage::Validate => 90,
            RunStage::Done => 100,
            RunStage::Error => 0,
        }
    }

}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            RunStage::Start => "start",
            RunStage::Discover => "discover",
            RunStage::Extract => "extract",
            RunStage::Summarize => "summarize",
            RunStage::Compose => "compose",
            RunStage::Validate => "validate",
            RunStage::Done => "done",
            RunStage::Error => "error",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RunStage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(RunStage::Start),
            "discover" => Ok(RunStage::Discover),
            "extract" => Ok(RunStage::Extract),
            "summarize" => Ok(RunStage::Summarize),
            "compose" => Ok(RunStage::Compose),
            "validate" => Ok(RunStage::Validate),
            "done" => Ok(RunStage::Done),
            "error" => Ok(RunStage::Error),
            _ => Err(()),
        }
    }
}

/// 运行状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// 进行中
    #[default]
    Started,
    /// 成功完成
    Completed,
    /// 出错结束
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunStatus::Started => write!(f, "started"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for RunStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(RunStatus::Started),
            "completed" => Ok(RunStatus::Completed),
            "error" => Ok(RunStatus::Error),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的阶段转换，阶段只能沿固定顺序前进
    #[error("Invalid stage transition")]
    InvalidStageTransition,

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Run {
    /// 创建一个新的运行
    pub fn new(site_key: String, site_url: String, settings: GenerationSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_key,
            site_url,
            settings,
            stage: RunStage::Start,
            status: RunStatus::Started,
            progress: 0,
            message: "Generation started".to_string(),
            error_message: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// 推进到下一阶段
    ///
    /// 阶段只允许沿固定顺序向前推进，进入Done时同时落为
    /// Completed终态。终态运行不可再变更。
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 成功推进
    /// * `Err(DomainError)` - 阶段转换不符合单调顺序
    pub fn advance(&mut self, stage: RunStage, message: impl Into<String>) -> Result<(), DomainError> {
        if self.status != RunStatus::Started {
            return Err(DomainError::InvalidStageTransition);
        }
        let (current, next) = match (self.stage.order_index(), stage.order_index()) {
            (Some(c), Some(n)) => (c, n),
            _ => return Err(DomainError::InvalidStageTransition),
        };
        if next < current {
            return Err(DomainError::InvalidStageTransition);
        }

        self.stage = stage;
        self.progress = stage.progress();
        self.message = message.into();

        if stage == RunStage::Done {
            self.status = RunStatus::Completed;
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// 将运行置为出错终态
    ///
    /// 可从任意非终态阶段进入，终态运行不再变更。
    pub fn fail(&mut self, error_message: impl Into<String>) {
        if self.status != RunStatus::Started {
            return;
        }
        self.stage = RunStage::Error;
        self.status = RunStatus::Error;
        self.progress = 0;
        let msg = error_message.into();
        self.message = msg.clone();
        self.error_message = Some(msg);
        self.finished_at = Some(Utc::now());
    }

    /// 运行是否已进入终态
    pub fn is_terminal(&self) -> bool {
        self.status != RunStatus::Started
    }
}
