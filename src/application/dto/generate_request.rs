// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::run::{GenerationSettings, Language};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 生成请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequestDto {
    /// 站点URL，爬取的种子
    #[validate(url)]
    pub site_url: String,
    /// 用户附加提示，原样并入摘要提示词
    #[serde(default)]
    pub extras: String,
    /// 页面数上限，缺省时取服务端默认值
    #[validate(range(min = 1, max = 500))]
    pub max_pages: Option<u32>,
    /// 输出语言
    #[serde(default)]
    pub language: Language,
    /// 严格校验模式
    #[serde(default = "default_true")]
    pub strict_mode: bool,
    /// 是否输出Optional分组
    #[serde(default = "default_true")]
    pub include_optional: bool,
    /// 白名单域名，逗号分隔
    #[serde(default)]
    pub whitelist_domains: String,
}

fn default_true() -> bool {
    true
}

impl GenerateRequestDto {
    /// 转换为生成选项
    pub fn to_settings(&self, default_max_pages: u32) -> GenerationSettings {
        let whitelist_domains: Vec<String> = self
            .whitelist_domains
            .split(',')
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();

        GenerationSettings {
            max_pages: self.max_pages.unwrap_or(default_max_pages).max(1),
            language: self.language,
            strict_mode: self.strict_mode,
            include_optional: self.include_optional,
            whitelist_domains,
            extras: self.extras.clone(),
        }
    }
}
