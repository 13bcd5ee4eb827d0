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

use crate::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse};
use async_trait::async_trait;
use std::time::Instant;

/// 抓取引擎
///
/// 基于reqwest实现的基本HTTP抓取引擎
pub struct ReqwestEngine;

/// 可接受的HTML内容类型前缀
const HTML_CONTENT_TYPES: [&str; 2] = ["text/html", "application/xhtml+xml"];

#[async_trait]
impl FetchEngine for ReqwestEngine {
    /// 执行HTTP抓取
    ///
    /// 带超时和字节上限的单次GET请求。非2xx状态码、非HTML
    /// 内容类型和超限响应体均作为分类错误返回。
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 抓取响应
    /// * `Err(EngineError)` - 分类后的抓取失败
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; llogen/0.1; +http://llogen.dev)")
            .timeout(request.timeout)
            .build()?;

        let start = Instant::now();
        let response = client.get(&request.url).send().await.map_err(|e| {
            if e.is_timeout() {
                EngineError::Timeout
            } else {
                EngineError::RequestFailed(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        // Content-type must be HTML; other types are classified failures
        let lowered = content_type.to_ascii_lowercase();
        if !HTML_CONTENT_TYPES.iter().any(|t| lowered.starts_with(t)) {
            return Err(EngineError::UnsupportedContentType(content_type));
        }

        // Content-Length gives an early exit before reading the body
        if let Some(len) = response.content_length() {
            if len as usize > request.max_body_bytes {
                return Err(EngineError::BodyTooLarge(len as usize));
            }
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                EngineError::Timeout
            } else {
                EngineError::RequestFailed(e)
            }
        })?;

        if bytes.len() > request.max_body_bytes {
            return Err(EngineError::BodyTooLarge(bytes.len()));
        }

        let content = String::from_utf8_lossy(&bytes).into_owned();

        Ok(FetchResponse {
            status_code: status.as_u16(),
            content,
            content_type,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// 获取引擎名称
    ///
    /// # 返回值
    ///
    /// 引擎名称
    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
