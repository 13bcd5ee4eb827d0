// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 不参与爬取的资源文件扩展名
const SKIPPED_EXTENSIONS: [&str; 8] = [
    ".pdf", ".jpg", ".png", ".gif", ".css", ".js", ".xml", ".json",
];

/// 不参与爬取的路径前缀
const SKIPPED_PATH_PREFIXES: [&str; 3] = ["/api/", "/admin/", "/_"];

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 规范化URL，作为访问去重和站点标识的键
///
/// 保留 scheme + host + path，去除查询参数和片段，
/// 并去掉非根路径末尾的斜杠。
pub fn normalize_url(url: &Url) -> String {
    let scheme = url.scheme();
    let host = url.host_str().unwrap_or_default();
    let mut path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", scheme, host, port, path),
        None => format!("{}://{}{}", scheme, host, path),
    }
}

/// 从站点URL推导运行的站点键
pub fn site_key(url: &Url) -> String {
    normalize_url(url)
}

/// 判断URL是否在爬取范围内
///
/// 仅当URL的主机与种子主机一致，或出现在白名单域名中时在范围内。
pub fn is_in_scope(url: &Url, seed_host: &str, whitelist_domains: &[String]) -> bool {
    match url.host_str() {
        Some(host) => {
            host.eq_ignore_ascii_case(seed_host)
                || whitelist_domains.iter().any(|d| host.eq_ignore_ascii_case(d))
        }
        None => false,
    }
}

/// 判断URL路径是否值得入队爬取
///
/// 过滤静态资源和非内容端点。
pub fn is_crawlable_path(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    if SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }
    if SKIPPED_PATH_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return false;
    }
    true
}
