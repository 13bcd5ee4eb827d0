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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、爬取器和LLM等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 爬取器配置
    pub crawler: CrawlerSettings,
    /// LLM配置
    pub llm: LlmSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 爬取器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    /// 单次运行内的并发抓取数
    pub fetch_concurrency: usize,
    /// 单页抓取超时时间（秒）
    pub fetch_timeout_secs: u64,
    /// 单页响应体字节上限
    pub max_body_bytes: usize,
    /// 未指定时的默认页面数上限
    pub default_max_pages: u32,
}

/// LLM配置设置
///
/// 通过环境变量进行配置：
/// - `LLOGEN__LLM__API_KEY` - LLM API密钥
/// - `LLOGEN__LLM__MODEL` - 使用的模型名称
/// - `LLOGEN__LLM__API_BASE_URL` - LLM API基础URL
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    /// LLM API密钥
    pub api_key: Option<String>,
    /// 模型名称
    pub model: String,
    /// API基础URL
    pub api_base_url: String,
    /// 单次请求的提示词字符预算
    pub max_batch_chars: usize,
    /// 单页文本截断长度
    pub page_text_limit: usize,
    /// 对LLM API的每分钟请求上限
    pub requests_per_minute: u32,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            // Default crawler settings
            .set_default("crawler.fetch_concurrency", 5)?
            .set_default("crawler.fetch_timeout_secs", 10)?
            .set_default("crawler.max_body_bytes", 2 * 1024 * 1024)?
            .set_default("crawler.default_max_pages", 50)?
            // Default LLM settings
            .set_default("llm.model", "gpt-4o-mini")?
            .set_default("llm.api_base_url", "https://api.openai.com/v1")?
            .set_default("llm.max_batch_chars", 100_000)?
            .set_default("llm.page_text_limit", 10_000)?
            .set_default("llm.requests_per_minute", 30)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("LLOGEN").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
