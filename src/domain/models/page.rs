// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 页面记录
///
/// 运行内每个被访问URL对应一条记录，由爬取/提取阶段独占，
/// 汇入摘要输入后即丢弃，不做持久化。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// 规范化后的页面URL
    pub url: String,
    /// 距种子页面的跳数
    pub depth: u32,
    /// 抓取结果
    pub fetch_outcome: FetchOutcome,
    /// 原始响应体字节数
    pub raw_size: usize,
    /// 提取出的正文文本
    pub extracted_text: String,
    /// 提取出的页面标题
    pub extracted_title: Option<String>,
}

impl PageRecord {
    /// 创建一条失败的页面记录
    pub fn failed(url: String, depth: u32, failure: FetchFailure) -> Self {
        Self {
            url,
            depth,
            fetch_outcome: FetchOutcome::Failed(failure),
            raw_size: 0,
            extracted_text: String::new(),
            extracted_title: None,
        }
    }

    /// 抓取是否成功
    pub fn succeeded(&self) -> bool {
        matches!(self.fetch_outcome, FetchOutcome::Success)
    }
}

/// 抓取结果枚举
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// 抓取成功
    Success,
    /// 抓取失败及分类原因
    Failed(FetchFailure),
}

/// 抓取失败原因枚举
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailure {
    /// 请求超时
    Timeout,
    /// 非2xx状态码
    HttpStatus(u16),
    /// 非HTML内容类型
    NotHtml(String),
    /// 响应体超过字节上限
    TooLarge(usize),
    /// 网络层错误
    Network(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchFailure::Timeout => write!(f, "timeout"),
            FetchFailure::HttpStatus(code) => write!(f, "http status {}", code),
            FetchFailure::NotHtml(ct) => write!(f, "unsupported content type: {}", ct),
            FetchFailure::TooLarge(size) => write!(f, "body too large: {} bytes", size),
            FetchFailure::Network(msg) => write!(f, "network error: {}", msg),
        }
    }
}
