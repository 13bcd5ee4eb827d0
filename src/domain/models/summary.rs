// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 摘要条目
///
/// 摘要能力对单个页面的结构化输出，仅由组装器消费。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryEntry {
    /// 页面URL
    pub url: String,
    /// 分组提示
    pub section_hint: SectionHint,
    /// 页面标题
    pub title: String,
    /// 一句话描述
    pub description: String,
}

impl SummaryEntry {
    /// 为摘要失败的页面构造最小降级条目
    ///
    /// 标题取页面自身的标题，描述留空。
    pub fn fallback(url: String, title: Option<String>) -> Self {
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| url.clone());
        Self {
            url,
            section_hint: SectionHint::Docs,
            title,
            description: String::new(),
        }
    }
}

/// 分组提示枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SectionHint {
    /// 文档类页面
    #[default]
    Docs,
    /// 政策/条款类页面
    Policies,
    /// 可选补充页面
    Optional,
    /// 无法归类
    Other,
}

impl fmt::Display for SectionHint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SectionHint::Docs => write!(f, "docs"),
            SectionHint::Policies => write!(f, "policies"),
            SectionHint::Optional => write!(f, "optional"),
            SectionHint::Other => write!(f, "other"),
        }
    }
}

impl FromStr for SectionHint {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docs" => Ok(SectionHint::Docs),
            "policies" => Ok(SectionHint::Policies),
            "optional" => Ok(SectionHint::Optional),
            "other" => Ok(SectionHint::Other),
            _ => Err(()),
        }
    }
}
