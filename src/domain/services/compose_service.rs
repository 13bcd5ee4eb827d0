// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::summary::{SectionHint, SummaryEntry};

/// 文档组装服务
///
/// 将结构化的摘要条目组装为llms.txt文本。相同输入产生
/// 字节一致的输出，不含随机性和时钟内容。
pub struct ComposeService;

impl ComposeService {
    /// 组装llms.txt文档
    ///
    /// 分组顺序固定为 Docs、Policies、Optional，Optional仅在
    /// include_optional为真且存在对应条目时输出。各分组内条目
    /// 保持爬取的首次发现顺序，不重新排序。归类为Other的条目
    /// 并入Docs分组。
    ///
    /// # 参数
    ///
    /// * `site_title` - 站点标题
    /// * `site_description` - 站点一句话描述
    /// * `notes` - 自由形式的备注列表
    /// * `entries` - 按首次发现顺序排列的摘要条目
    /// * `include_optional` - 是否输出Optional分组
    pub fn compose(
        site_title: &str,
        site_description: &str,
        notes: &[String],
        entries: &[SummaryEntry],
        include_optional: bool,
    ) -> String {
        let mut doc = String::new();

        doc.push_str(&format!("# {}\n", site_title.trim()));

        let description = site_description.trim();
        if !description.is_empty() {
            doc.push_str(&format!("\n> {}\n", description));
        }

        if !notes.is_empty() {
            doc.push('\n');
            for note in notes {
                doc.push_str(&format!("- {}\n", note.trim()));
            }
        }

        Self::push_section(&mut doc, "Docs", entries, |hint| {
            matches!(hint, SectionHint::Docs | SectionHint::Other)
        });
        Self::push_section(&mut doc, "Policies", entries, |hint| {
            matches!(hint, SectionHint::Policies)
        });
        if include_optional {
            Self::push_section(&mut doc, "Optional", entries, |hint| {
                matches!(hint, SectionHint::Optional)
            });
        }

        doc
    }

    /// 输出单个分组，无匹配条目时整组省略
    fn push_section(
        doc: &mut String,
        heading: &str,
        entries: &[SummaryEntry],
        matches_hint: impl Fn(SectionHint) -> bool,
    ) {
        let selected: Vec<&SummaryEntry> = entries
            .iter()
            .filter(|e| matches_hint(e.section_hint))
            .collect();
        if selected.is_empty() {
            return;
        }

        doc.push_str(&format!("\n## {}\n", heading));
        for entry in selected {
            let line = format!(
                "- [{}]({}): {}",
                entry.title.trim(),
                entry.url,
                entry.description.trim()
            );
            doc.push_str(line.trim_end());
            doc.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, hint: SectionHint, title: &str, description: &str) -> SummaryEntry {
        SummaryEntry {
            url: url.to_string(),
            section_hint: hint,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        let entries = vec![
            entry("https://e.com/", SectionHint::Docs, "Home", "Landing page."),
            entry("https://e.com/tos", SectionHint::Policies, "Terms", "Legal terms."),
        ];
        let notes = vec!["Indexed 2 pages from e.com".to_string()];

        let a = ComposeService::compose("Example", "An example site.", &notes, &entries, true);
        let b = ComposeService::compose("Example", "An example site.", &notes, &entries, true);

        assert_eq!(a, b);
    }

    #[test]
    fn test_compose_structure_and_section_order() {
        let entries = vec![
            entry("https://e.com/opt", SectionHint::Optional, "Blog", "Posts."),
            entry("https://e.com/", SectionHint::Docs, "Home", "Landing."),
            entry("https://e.com/tos", SectionHint::Policies, "Terms", "Legal."),
        ];

        let doc = ComposeService::compose("Example", "Site.", &[], &entries, true);

        let docs_pos = doc.find("## Docs").unwrap();
        let policies_pos = doc.find("## Policies").unwrap();
        let optional_pos = doc.find("## Optional").unwrap();
        assert!(docs_pos < policies_pos);
        assert!(policies_pos < optional_pos);
        assert!(doc.starts_with("# Example\n"));
        assert!(doc.contains("> Site.\n"));
    }

    #[test]
    fn test_compose_omits_optional_when_disabled() {
        let entries = vec![
            entry("https://e.com/", SectionHint::Docs, "Home", "Landing."),
            entry("https://e.com/blog", SectionHint::Optional, "Blog", "Posts."),
        ];

        let doc = ComposeService::compose("Example", "Site.", &[], &entries, false);

        assert!(!doc.contains("## Optional"));
        assert!(!doc.contains("Blog"));
    }

    #[test]
    fn test_compose_preserves_discovery_order_within_section() {
        let entries = vec![
            entry("https://e.com/z", SectionHint::Docs, "Zeta", "Last alphabetically."),
            entry("https://e.com/a", SectionHint::Docs, "Alpha", "First alphabetically."),
        ];

        let doc = ComposeService::compose("Example", "Site.", &[], &entries, true);

        let zeta_pos = doc.find("Zeta").unwrap();
        let alpha_pos = doc.find("Alpha").unwrap();
        assert!(zeta_pos < alpha_pos);
    }

    #[test]
    fn test_compose_folds_other_into_docs() {
        let entries = vec![entry(
            "https://e.com/misc",
            SectionHint::Other,
            "Misc",
            "Unclassified.",
        )];

        let doc = ComposeService::compose("Example", "Site.", &[], &entries, true);

        assert!(doc.contains("## Docs"));
        assert!(doc.contains("- [Misc](https://e.com/misc): Unclassified."));
    }

    #[test]
    fn test_compose_empty_description_has_no_trailing_space() {
        let entries = vec![entry("https://e.com/", SectionHint::Docs, "Home", "")];

        let doc = ComposeService::compose("Example", "Site.", &[], &entries, true);

        assert!(doc.contains("- [Home](https://e.com/):\n"));
    }
}
