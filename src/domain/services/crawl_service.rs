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

use crate::domain::models::page::FetchFailure;
use crate::engines::traits::{EngineError, FetchEngine, FetchRequest};
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::url_utils;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// 爬取服务
///
/// 以广度优先方式从种子URL出发发现站内页面，抓取受
/// 并发上限约束，frontier与visited集合是唯一的跨任务
/// 共享可变结构，由互斥锁保护。
pub struct CrawlService<E: FetchEngine> {
    /// 抓取引擎
    engine: Arc<E>,
    /// 并发抓取数上限
    fetch_concurrency: usize,
    /// 单页抓取超时
    fetch_timeout: Duration,
    /// 单页响应体字节上限
    max_body_bytes: usize,
    /// 页面级重试策略
    retry_policy: RetryPolicy,
}

/// 单个已爬取页面
///
/// 爬取阶段的输出，保留原始HTML供提取阶段消费。
#[derive(Debug, Clone)]
pub struct CrawledPage {
    /// 规范化后的页面URL
    pub url: String,
    /// 距种子页面的跳数
    pub depth: u32,
    /// 原始HTML，抓取失败时为空
    pub html: String,
    /// 响应体字节数
    pub raw_size: usize,
    /// 抓取失败原因，成功时为空
    pub failure: Option<FetchFailure>,
}

impl CrawledPage {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// 爬取结果
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// 按首次访问顺序排列的页面，包含抓取失败的页面
    pub pages: Vec<CrawledPage>,
    /// 发现但不在范围内、未入队的链接
    pub out_of_scope: Vec<String>,
}

/// frontier与visited集合
///
/// 多个并发抓取任务之间唯一共享的可变结构。
struct Frontier {
    queue: VecDeque<(Url, u32)>,
    visited: HashSet<String>,
}

impl Frontier {
    fn new(seed: Url) -> Self {
        let mut visited = HashSet::new();
        visited.insert(url_utils::normalize_url(&seed));
        let mut queue = VecDeque::new();
        queue.push_back((seed, 0));
        Self { queue, visited }
    }

    /// 入队尚未见过的URL
    fn enqueue_if_new(&mut self, url: Url, depth: u32) {
        let key = url_utils::normalize_url(&url);
        if self.visited.insert(key) {
            self.queue.push_back((url, depth));
        }
    }

    /// 按FIFO顺序取出最多n个URL
    fn dequeue_batch(&mut self, n: usize) -> Vec<(Url, u32)> {
        let take = n.min(self.queue.len());
        self.queue.drain(..take).collect()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<E: FetchEngine> CrawlService<E> {
    /// 创建新的爬取服务实例
    pub fn new(
        engine: Arc<E>,
        fetch_concurrency: usize,
        fetch_timeout: Duration,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            engine,
            fetch_concurrency: fetch_concurrency.max(1),
            fetch_timeout,
            max_body_bytes,
            retry_policy: RetryPolicy {
                max_retries: 2,
                initial_backoff: Duration::from_millis(500),
                ..RetryPolicy::standard()
            },
        }
    }

    /// 从种子URL发现站内页面
    ///
    /// 广度优先遍历，visited集合按规范化URL去重，保证每个
    /// URL至多抓取一次。范围外的链接记录但不入队。访问数
    /// 达到max_pages或frontier耗尽时停止，max_pages是硬上限。
    /// 单页抓取失败不中止爬取。
    ///
    /// # 参数
    ///
    /// * `seed_url` - 种子URL
    /// * `max_pages` - 访问页面数硬上限
    /// * `whitelist_domains` - 种子主机外允许的主机
    ///
    /// # 返回值
    ///
    /// 按首次访问顺序排列的页面记录，种子页面在首位
    pub async fn discover(
        &self,
        seed_url: &Url,
        max_pages: u32,
        whitelist_domains: &[String],
    ) -> CrawlOutcome {
        let seed_host = seed_url.host_str().unwrap_or_default().to_string();
        let frontier = Mutex::new(Frontier::new(seed_url.clone()));
        let mut outcome = CrawlOutcome::default();
        let mut out_of_scope_seen = HashSet::new();
        let mut budget = max_pages as usize;

        while budget > 0 {
            let batch = {
                let mut guard = frontier.lock();
                if guard.is_empty() {
                    break;
                }
                guard.dequeue_batch(budget.min(self.fetch_concurrency))
            };
            if batch.is_empty() {
                break;
            }
            budget -= batch.len();

            // 并发抓取一批页面，按出队顺序回收结果
            let fetched: Vec<(usize, CrawledPage, Vec<Url>)> = stream::iter(
                batch.into_iter().enumerate().map(|(idx, (url, depth))| async move {
                    let page = self.fetch_page(&url, depth).await;
                    let links = if page.succeeded() {
                        LinkDiscoverer::extract_links(&page.html, &url)
                    } else {
                        Vec::new()
                    };
                    (idx, page, links)
                }),
            )
            .buffer_unordered(self.fetch_concurrency)
            .collect()
            .await;

            let mut ordered = fetched;
            ordered.sort_by_key(|(idx, _, _)| *idx);

            let mut guard = frontier.lock();
            for (_, page, links) in ordered {
                let next_depth = page.depth + 1;
                for link in links {
                    if !url_utils::is_in_scope(&link, &seed_host, whitelist_domains) {
                        let key = url_utils::normalize_url(&link);
                        if out_of_scope_seen.insert(key.clone()) {
                            outcome.out_of_scope.push(key);
                        }
                        continue;
                    }
                    if !url_utils::is_crawlable_path(&link) {
                        continue;
                    }
                    guard.enqueue_if_new(link, next_depth);
                }
                outcome.pages.push(page);
            }
        }

        let succeeded = outcome.pages.iter().filter(|p| p.succeeded()).count();
        info!(
            "Crawl finished: {} pages visited, {} succeeded, {} out-of-scope links",
            outcome.pages.len(),
            succeeded,
            outcome.out_of_scope.len()
        );

        outcome
    }

    /// 抓取单个页面，可重试的失败按策略重试
    async fn fetch_page(&self, url: &Url, depth: u32) -> CrawledPage {
        let normalized = url_utils::normalize_url(url);
        let request = FetchRequest {
            url: url.to_string(),
            timeout: self.fetch_timeout,
            max_body_bytes: self.max_body_bytes,
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!("Fetching {} (attempt {})", normalized, attempt);
            match self.engine.fetch(&request).await {
                Ok(response) => {
                    return CrawledPage {
                        url: normalized,
                        depth,
                        raw_size: response.content.len(),
                        html: response.content,
                        failure: None,
                    };
                }
                Err(e) => {
                    if e.is_retryable() && self.retry_policy.should_retry(attempt) {
                        let backoff = self.retry_policy.calculate_backoff(attempt);
                        debug!("Retrying {} after {:?}: {}", normalized, backoff, e);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    warn!("Fetch failed for {}: {}", normalized, e);
                    return CrawledPage {
                        url: normalized,
                        depth,
                        html: String::new(),
                        raw_size: 0,
                        failure: Some(classify_engine_error(e)),
                    };
                }
            }
        }
    }
}

/// 将引擎错误映射为页面级失败分类
fn classify_engine_error(error: EngineError) -> FetchFailure {
    match error {
        EngineError::Timeout => FetchFailure::Timeout,
        EngineError::HttpStatus(code) => FetchFailure::HttpStatus(code),
        EngineError::UnsupportedContentType(ct) => FetchFailure::NotHtml(ct),
        EngineError::BodyTooLarge(size) => FetchFailure::TooLarge(size),
        EngineError::RequestFailed(e) if e.is_timeout() => FetchFailure::Timeout,
        other => FetchFailure::Network(other.to_string()),
    }
}

/// 链接发现器
///
/// 负责从HTML内容中提取出站链接
pub struct LinkDiscoverer;

impl LinkDiscoverer {
    /// 从HTML内容中提取链接
    ///
    /// 忽略片段、mailto和javascript链接，仅保留http/https，
    /// 相对路径基于页面URL解析。返回顺序保持文档顺序并去重，
    /// 供下游保留站点自身的信息层级。
    pub fn extract_links(html_content: &str, base_url: &Url) -> Vec<Url> {
        let fragment = Html::parse_document(html_content);
        let selector = Selector::parse("a").expect("static selector");
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in fragment.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if href.is_empty()
                    || href.starts_with('#')
                    || href.starts_with("mailto:")
                    || href.starts_with("javascript:")
                {
                    continue;
                }

                if let Ok(url) = base_url.join(href) {
                    if url.scheme() != "http" && url.scheme() != "https" {
                        continue;
                    }
                    // Strip fragment to improve deduplication
                    let mut url_clean = url.clone();
                    url_clean.set_fragment(None);
                    if seen.insert(url_utils::normalize_url(&url_clean)) {
                        links.push(url_clean);
                    }
                }
            }
        }

        links
    }
}

#[cfg(test)]
#[path = "crawl_service_test.rs"]
mod tests;
