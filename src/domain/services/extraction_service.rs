// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// 提取正文低于该长度时回退为整页文本
const MIN_CONTENT_LEN: usize = 200;

/// 候选正文容器选择器
static CANDIDATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article, main, section, div").expect("static selector"));

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("static selector"));
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("static selector"));
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("static selector"));
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("static selector"));

/// 样板内容剥离正则
///
/// `<header`后必须跟空白或`>`，避免误伤`<head>`。
static BOILERPLATE_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)<script[\s>].*?</script>",
        r"(?is)<style[\s>].*?</style>",
        r"(?is)<noscript[\s>].*?</noscript>",
        r"(?is)<nav[\s>].*?</nav>",
        r"(?is)<header[\s>].*?</header>",
        r"(?is)<footer[\s>].*?</footer>",
        r"(?is)<aside[\s>].*?</aside>",
        r"(?is)<form[\s>].*?</form>",
        r"(?s)<!--.*?-->",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// 提取出的页面内容
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// 检测到的页面标题
    pub title: Option<String>,
    /// 清理后的正文文本
    pub text: String,
}

/// 内容提取服务
///
/// 从原始HTML中剥离导航和样板，基于内容密度评分选出正文
/// 块。评分结果过短时回退为整页文本。畸形标记不会导致
/// 失败，只会降级为尽力而为的文本。
pub struct ExtractionService;

impl ExtractionService {
    /// 提取页面标题和可读正文
    pub fn extract(html: &str) -> ExtractedContent {
        if html.trim().is_empty() {
            return ExtractedContent {
                title: None,
                text: String::new(),
            };
        }

        let title = Self::extract_title(html);

        // 先剥离样板再解析，保证评分只看正文候选
        let mut stripped = html.to_string();
        for re in BOILERPLATE_REGEXES.iter() {
            stripped = re.replace_all(&stripped, " ").into_owned();
        }

        let document = Html::parse_document(&stripped);

        let body_text = document
            .select(&BODY_SELECTOR)
            .next()
            .map(|b| Self::element_text(b))
            .unwrap_or_default();

        let best = document
            .select(&CANDIDATE_SELECTOR)
            .map(|el| (Self::score(el), el))
            .max_by(|(a, _), (b, _)| a.total_cmp(b));

        let candidate_text = best
            .filter(|(score, _)| *score > 0.0)
            .map(|(_, el)| Self::element_text(el))
            .unwrap_or_default();

        // 候选正文过短时回退为整页文本，非空页面不得返回空正文
        let text = if candidate_text.len() >= MIN_CONTENT_LEN {
            candidate_text
        } else if body_text.len() > candidate_text.len() {
            body_text
        } else {
            candidate_text
        };

        ExtractedContent {
            title,
            text: Self::clean_text(&text),
        }
    }

    /// 从<title>提取标题，缺失时回退到第一个<h1>
    fn extract_title(html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        let from_title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|t| t.text().collect::<String>())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if from_title.is_some() {
            return from_title;
        }

        document
            .select(&H1_SELECTOR)
            .next()
            .map(|h| h.text().collect::<Vec<_>>().join(" "))
            .map(|t| WHITESPACE_REGEX.replace_all(t.trim(), " ").into_owned())
            .filter(|t| !t.is_empty())
    }

    /// 内容密度评分：文本量扣除链接文本占比
    fn score(el: ElementRef) -> f64 {
        let total: usize = el.text().map(|t| t.trim().len()).sum();
        if total == 0 {
            return 0.0;
        }
        let link_text: usize = el
            .select(&ANCHOR_SELECTOR)
            .flat_map(|a| a.text())
            .map(|t| t.trim().len())
            .sum();
        let link_density = link_text as f64 / total as f64;
        total as f64 * (1.0 - link_density)
    }

    fn element_text(el: ElementRef) -> String {
        el.text()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 清理和规范化文本
    fn clean_text(text: &str) -> String {
        let decoded = html_escape::decode_html_entities(text).into_owned();
        let filtered: String = decoded
            .chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect();
        WHITESPACE_REGEX
            .replace_all(filtered.trim(), " ")
            .into_owned()
    }
}

#[cfg(test)]
#[path = "extraction_service_test.rs"]
mod tests;
