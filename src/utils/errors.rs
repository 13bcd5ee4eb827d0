// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 流水线错误类型
///
/// 页面级错误（抓取失败、提取降级）在产生处被吸收并记录
/// 日志，不出现在这里；只有运行级的致命错误会向上传播并
/// 把运行状态置为error。
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("summarizer transient failure: {0}")]
    SummarizerTransient(String),

    #[error("summarizer rejected request: {0}")]
    SummarizerRejection(String),

    #[error("no content discovered")]
    NoContentDiscovered,

    #[error("validation failed: {}", .0.join("; "))]
    ValidationFailure(Vec<String>),

    #[error("run cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// 返回面向调用方的分类错误消息
    ///
    /// 内部堆栈细节不外泄，调用方只看到分类后的原因。
    pub fn classified_message(&self) -> String {
        match self {
            PipelineError::NoContentDiscovered => "NoContentDiscovered".to_string(),
            PipelineError::ValidationFailure(violations) => {
                format!("ValidationFailure: {}", violations.join("; "))
            }
            PipelineError::Cancelled => "Cancelled".to_string(),
            PipelineError::SummarizerTransient(_) => {
                "SummarizerTransientFailure: retries exhausted".to_string()
            }
            PipelineError::SummarizerRejection(msg) => {
                format!("SummarizerRejection: {}", msg)
            }
            other => other.to_string(),
        }
    }
}
