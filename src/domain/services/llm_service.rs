// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Deserialize;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::config::settings::LlmSettings;
use crate::domain::models::run::{GenerationSettings, Language};
use crate::domain::models::summary::{SectionHint, SummaryEntry};
use crate::utils::errors::PipelineError;
use crate::utils::retry_policy::{is_retryable_error, RetryPolicy};

/// 摘要输入页面
#[derive(Debug, Clone)]
pub struct PageInput {
    /// 页面URL
    pub url: String,
    /// 提取出的页面标题
    pub title: Option<String>,
    /// 提取出的正文文本
    pub text: String,
}

/// 摘要能力特质
///
/// 外部LLM能力的调用侧抽象，可能限流、可能失败。
#[async_trait]
pub trait SummarizerTrait: Send + Sync {
    /// 为一组页面生成结构化摘要条目
    ///
    /// 返回条目与输入页面一一对应且保持输入顺序，单页摘要
    /// 失败时以降级条目占位。所有页面都失败时返回错误。
    async fn summarize(
        &self,
        pages: &[PageInput],
        settings: &GenerationSettings,
    ) -> Result<Vec<SummaryEntry>, PipelineError>;
}

/// LLM服务 - 处理与LLM提供商的交互
///
/// # 功能
///
/// 以OpenAI兼容的chat completions接口调用摘要能力。
/// 页面按字符预算分批，瞬时失败按指数退避重试，请求
/// 频率受限流器约束。
pub struct LlmService {
    api_key: Option<String>,
    model: String,
    api_base_url: String,
    max_batch_chars: usize,
    page_text_limit: usize,
    retry_policy: RetryPolicy,
    limiter: DefaultDirectRateLimiter,
    client: reqwest::Client,
}

/// LLM响应中的单个条目
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    url: String,
    #[serde(default)]
    section: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

impl LlmService {
    /// 从配置创建LLM服务实例
    pub fn new(settings: &LlmSettings) -> Self {
        let rpm = NonZeroU32::new(settings.requests_per_minute.max(1)).expect("non-zero rpm");
        Self {
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            api_base_url: settings.api_base_url.clone(),
            max_batch_chars: settings.max_batch_chars,
            page_text_limit: settings.page_text_limit,
            retry_policy: RetryPolicy::slow(),
            limiter: RateLimiter::direct(Quota::per_minute(rpm)),
            client: reqwest::Client::new(),
        }
    }

    /// 将页面按字符预算分批
    ///
    /// 每批至少一个页面，批内容量不超过提示词预算。
    fn batch_pages<'a>(&self, pages: &'a [PageInput]) -> Vec<Vec<&'a PageInput>> {
        let mut batches = Vec::new();
        let mut current: Vec<&PageInput> = Vec::new();
        let mut current_chars = 0usize;

        for page in pages {
            let page_chars = page.text.len().min(self.page_text_limit) + page.url.len();
            if !current.is_empty() && current_chars + page_chars > self.max_batch_chars {
                batches.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            current.push(page);
            current_chars += page_chars;
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }

    /// 构造单批页面的提示词
    fn build_prompt(&self, batch: &[&PageInput], settings: &GenerationSettings) -> String {
        let mut content_blocks = String::new();
        for page in batch {
            content_blocks.push_str(&format!(
                "=== PAGE: {} ===\nTITLE: {}\n{}\n\n",
                page.url,
                page.title.as_deref().unwrap_or(""),
                truncate_chars(&page.text, self.page_text_limit),
            ));
        }

        let language_instruction = match settings.language {
            Language::Auto => "Infer the output language from the page content.".to_string(),
            other => format!("Write all titles and descriptions in language '{}'.", other),
        };

        format!(
            "You are an expert web content analyzer preparing entries for a \
             standards-compliant llms.txt file.\n\n\
             For EVERY page below, produce one JSON object with fields:\n\
             - \"url\": the page URL, copied exactly\n\
             - \"section\": one of \"docs\", \"policies\", \"optional\", \"other\"\n\
             - \"title\": a short human-readable page title\n\
             - \"description\": one concise sentence describing the page\n\n\
             Classification rules: documentation, guides, product and reference \
             pages are \"docs\"; legal, privacy, terms and policy pages are \
             \"policies\"; changelogs, blogs and auxiliary material are \
             \"optional\"; anything else is \"other\".\n\
             {}\n\
             Strict mode: {}. Custom context from the user: {}\n\n\
             Return ONLY a JSON array of these objects, no markdown, no prose.\n\n\
             {}",
            language_instruction,
            settings.strict_mode,
            if settings.extras.is_empty() {
                "(none)"
            } else {
                &settings.extras
            },
            content_blocks
        )
    }

    /// 发送单次chat completions请求并解析出条目数组
    async fn request_entries(&self, prompt: &str) -> Result<Vec<RawEntry>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("LLM API key not configured"))?;

        // 限流器先行，退避只处理失败
        self.limiter.until_ready().await;

        let request_body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a helpful summarization assistant. You output only valid JSON."
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": 0.3
        });

        let url = format!("{}/chat/completions", self.api_base_url);
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request_body)
            .send()
            .await
            .context("Failed to send request to LLM API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "LLM API returned error: {} - {}",
                status,
                error_text
            ));
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse LLM API response")?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format from LLM API"))?;

        // Clean up potential markdown code blocks
        let clean_content = content
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        serde_json::from_str::<Vec<RawEntry>>(clean_content)
            .context("Failed to parse summary entries from LLM response")
    }

    /// 带退避重试的批次摘要
    ///
    /// 批次最终失败时（重试耗尽或不可重试）返回失败分类，
    /// 调用方为批内页面生成降级条目。
    async fn summarize_batch(
        &self,
        batch: &[&PageInput],
        settings: &GenerationSettings,
    ) -> Result<Vec<RawEntry>, BatchFailure> {
        let prompt = self.build_prompt(batch, settings);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.request_entries(&prompt).await {
                Ok(entries) => return Ok(entries),
                Err(e) => {
                    let transient = is_retryable_error(&e);
                    if transient && self.retry_policy.should_retry(attempt) {
                        let backoff = self.retry_policy.calculate_backoff(attempt);
                        debug!("Summarizer transient failure, retrying in {:?}: {}", backoff, e);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    warn!("Summarizer failed for batch of {} pages: {}", batch.len(), e);
                    return Err(BatchFailure {
                        transient,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

/// 批次级摘要失败
struct BatchFailure {
    /// 是否为重试耗尽的瞬时失败
    transient: bool,
    message: String,
}

#[async_trait]
impl SummarizerTrait for LlmService {
    async fn summarize(
        &self,
        pages: &[PageInput],
        settings: &GenerationSettings,
    ) -> Result<Vec<SummaryEntry>, PipelineError> {
        if pages.is_empty() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::with_capacity(pages.len());
        let mut any_real = false;
        let mut last_failure: Option<BatchFailure> = None;

        for batch in self.batch_pages(pages) {
            let raw = match self.summarize_batch(&batch, settings).await {
                Ok(list) => Some(list),
                Err(failure) => {
                    last_failure = Some(failure);
                    None
                }
            };

            for page in batch {
                let matched = raw
                    .as_deref()
                    .and_then(|list| list.iter().find(|e| e.url == page.url));
                match matched {
                    Some(raw_entry) if !raw_entry.title.trim().is_empty() => {
                        any_real = true;
                        entries.push(SummaryEntry {
                            url: page.url.clone(),
                            section_hint: SectionHint::from_str(&raw_entry.section)
                                .unwrap_or(SectionHint::Other),
                            title: raw_entry.title.trim().to_string(),
                            description: raw_entry.description.trim().to_string(),
                        });
                    }
                    // 页面级失败只降级该页的条目
                    _ => entries.push(SummaryEntry::fallback(page.url.clone(), page.title.clone())),
                }
            }
        }

        // 所有页面都没有真实条目时整体失败
        if !any_real {
            return Err(match last_failure {
                Some(failure) if failure.transient => {
                    PipelineError::SummarizerTransient(failure.message)
                }
                Some(failure) => PipelineError::SummarizerRejection(failure.message),
                None => PipelineError::SummarizerRejection(
                    "summarizer produced no entries for any page".to_string(),
                ),
            });
        }

        Ok(entries)
    }
}

/// 在字符边界上安全截断文本
fn truncate_chars(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
#[path = "llm_service_test.rs"]
mod tests;
