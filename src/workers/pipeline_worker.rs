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

use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::domain::models::artifact::ArtifactKind;
use crate::domain::models::page::{FetchOutcome, PageRecord};
use crate::domain::models::run::{RunStage, RunStatus};
use crate::domain::models::summary::SummaryEntry;
use crate::domain::repositories::run_repository::RunRepository;
use crate::domain::services::compose_service::ComposeService;
use crate::domain::services::crawl_service::{CrawlService, CrawledPage};
use crate::domain::services::extraction_service::ExtractionService;
use crate::domain::services::llm_service::{PageInput, SummarizerTrait};
use crate::domain::services::validate_service::ValidateService;
use crate::engines::traits::FetchEngine;
use crate::infrastructure::run_registry::{RunHandle, RunRegistry};
use crate::utils::errors::PipelineError;

/// 流水线工作器
///
/// 每次运行对应一个后台任务，依次执行
/// discover → extract → summarize → compose → validate，
/// 每个阶段完成后更新运行记录供调用方轮询。阶段N的输出
/// 完全物化后阶段N+1才开始，取消在阶段边界生效。
pub struct PipelineWorker<E, S, R>
where
    E: FetchEngine,
    S: SummarizerTrait,
    R: RunRepository,
{
    crawl_service: CrawlService<E>,
    summarizer: Arc<S>,
    repository: Arc<R>,
    registry: Arc<RunRegistry>,
}

impl<E, S, R> PipelineWorker<E, S, R>
where
    E: FetchEngine + 'static,
    S: SummarizerTrait + 'static,
    R: RunRepository + 'static,
{
    /// 创建新的流水线工作器实例
    pub fn new(
        crawl_service: CrawlService<E>,
        summarizer: Arc<S>,
        repository: Arc<R>,
        registry: Arc<RunRegistry>,
    ) -> Self {
        Self {
            crawl_service,
            summarizer,
            repository,
            registry,
        }
    }

    /// 执行一次完整的生成运行
    ///
    /// 所有退出路径都会落终态、通知仓库并释放活跃注册。
    #[instrument(skip(self, handle), fields(run_id = %handle.run.read().id, site = %handle.run.read().site_key))]
    pub async fn run(&self, handle: RunHandle) {
        let (run_id, site_key) = {
            let run = handle.run.read();
            (run.id, run.site_key.clone())
        };

        match self.execute(&handle).await {
            Ok(()) => {
                info!("Run completed");
                if let Err(e) = self
                    .repository
                    .mark_run_finished(run_id, RunStatus::Completed)
                    .await
                {
                    error!("Failed to mark run finished: {}", e);
                }
            }
            Err(e) => {
                let message = e.classified_message();
                warn!("Run failed: {}", message);
                handle.run.write().fail(message);
                if let Err(e) = self
                    .repository
                    .mark_run_finished(run_id, RunStatus::Error)
                    .await
                {
                    error!("Failed to mark run finished: {}", e);
                }
            }
        }

        self.registry.release(&site_key, run_id);
    }

    async fn execute(&self, handle: &RunHandle) -> Result<(), PipelineError> {
        let (run_id, site_url, settings) = {
            let run = handle.run.read();
            (run.id, run.site_url.clone(), run.settings.clone())
        };

        let seed = Url::parse(&site_url)
            .map_err(|e| PipelineError::Internal(format!("invalid seed url: {}", e)))?;
        let seed_host = seed.host_str().unwrap_or_default().to_string();

        // ---- discover ----
        self.advance(handle, RunStage::Discover, "Discovering pages...")?;
        let outcome = self
            .crawl_service
            .discover(&seed, settings.max_pages, &settings.whitelist_domains)
            .await;
        let fetched = outcome.pages.iter().filter(|p| p.succeeded()).count();
        if fetched == 0 {
            return Err(PipelineError::NoContentDiscovered);
        }

        // ---- extract ----
        self.advance(
            handle,
            RunStage::Extract,
            format!("Extracting content from {} pages...", fetched),
        )?;
        let records = extract_pages(outcome.pages);
        let inputs: Vec<PageInput> = records
            .iter()
            .filter(|r| r.succeeded() && !r.extracted_text.is_empty())
            .map(|r| PageInput {
                url: r.url.clone(),
                title: r.extracted_title.clone(),
                text: r.extracted_text.clone(),
            })
            .collect();
        if inputs.is_empty() {
            return Err(PipelineError::NoContentDiscovered);
        }

        // ---- summarize ----
        self.advance(
            handle,
            RunStage::Summarize,
            "Summarizing content with the language model...",
        )?;
        let entries = self.summarizer.summarize(&inputs, &settings).await?;

        // ---- compose ----
        self.advance(handle, RunStage::Compose, "Composing llms.txt...")?;
        let (site_title, site_description) = site_headline(&records, &entries, &seed_host);
        let notes = vec![format!(
            "Generated from {} pages on {}",
            inputs.len(),
            seed_host
        )];
        let document = ComposeService::compose(
            &site_title,
            &site_description,
            &notes,
            &entries,
            settings.include_optional,
        );

        // 产物在校验裁决前落库，校验失败时仍可查看
        self.repository
            .record_artifact(run_id, ArtifactKind::LlmsTxt, &document)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        // ---- validate ----
        self.advance(handle, RunStage::Validate, "Validating output...")?;
        let report = ValidateService::validate(&document, settings.strict_mode);
        for warning in &report.warnings {
            warn!("Validation warning: {}", warning);
        }
        if !report.ok {
            return Err(PipelineError::ValidationFailure(report.violations));
        }

        // ---- done ----
        self.advance(handle, RunStage::Done, "Generation completed successfully")?;
        Ok(())
    }

    /// 在阶段边界检查取消并推进运行记录
    fn advance(
        &self,
        handle: &RunHandle,
        stage: RunStage,
        message: impl Into<String>,
    ) -> Result<(), PipelineError> {
        if handle.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        handle
            .run
            .write()
            .advance(stage, message)
            .map_err(|e| PipelineError::Internal(e.to_string()))
    }
}

/// 对已爬取页面做内容提取
///
/// 同步的CPU密集工作，整体在summarize之前完成。
/// 抓取失败的页面保留分类原因，不参与后续阶段。
fn extract_pages(crawled: Vec<CrawledPage>) -> Vec<PageRecord> {
    crawled
        .into_iter()
        .map(|page| match page.failure {
            Some(failure) => PageRecord::failed(page.url, page.depth, failure),
            None => {
                let extracted = ExtractionService::extract(&page.html);
                PageRecord {
                    url: page.url,
                    depth: page.depth,
                    fetch_outcome: FetchOutcome::Success,
                    raw_size: page.raw_size,
                    extracted_text: extracted.text,
                    extracted_title: extracted.title,
                }
            }
        })
        .collect()
}

/// 从种子页面推导站点标题和一句话描述
///
/// 标题优先取种子页面提取出的标题，缺省回退为站点主机名；
/// 描述取种子页面对应条目的描述，缺省取第一个条目。
fn site_headline(
    records: &[PageRecord],
    entries: &[SummaryEntry],
    seed_host: &str,
) -> (String, String) {
    let seed_record = records.first();

    let title = seed_record
        .and_then(|r| r.extracted_title.clone())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| seed_host.to_string());

    let description = seed_record
        .and_then(|r| entries.iter().find(|e| e.url == r.url))
        .or_else(|| entries.first())
        .map(|e| e.description.clone())
        .unwrap_or_default();

    (title, description)
}

#[cfg(test)]
#[path = "pipeline_worker_test.rs"]
mod tests;
