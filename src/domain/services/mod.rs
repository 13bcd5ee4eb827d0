// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含生成流水线的核心业务逻辑服务：
/// - 爬取服务（crawl_service）：广度优先页面发现和链接提取
/// - 提取服务（extraction_service）：正文内容和标题提取
/// - LLM服务（llm_service）：页面摘要与分类
/// - 组装服务（compose_service）：llms.txt文档组装
/// - 校验服务（validate_service）：输出格式校验
pub mod compose_service;
pub mod crawl_service;
pub mod extraction_service;
pub mod llm_service;
pub mod validate_service;
