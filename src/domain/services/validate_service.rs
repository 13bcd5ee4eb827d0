// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

/// 严格模式下的单行长度上限
const MAX_LINE_LEN: usize = 500;

/// 链接行基本形式：`- [title](url)`，描述可缺省
static LINK_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^- \[[^\]]+\]\(\S+\)(:.*)?$").expect("static regex"));

/// 带非空描述的完整链接行形式
static LINK_LINE_STRICT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^- \[[^\]]+\]\(\S+\): \S.*$").expect("static regex"));

/// 校验报告
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// 是否通过
    pub ok: bool,
    /// 违规项，非空时校验失败
    pub violations: Vec<String>,
    /// 警告项，不影响通过与否
    pub warnings: Vec<String>,
}

/// 文档校验服务
///
/// 按llms.txt格式规则检查组装结果。严格模式额外要求行长
/// 上限、链接描述非空和Docs分组非空；非严格模式将分组
/// 空缺降级为警告。
pub struct ValidateService;

impl ValidateService {
    /// 校验llms.txt文档
    pub fn validate(document: &str, strict_mode: bool) -> ValidationReport {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        let lines: Vec<&str> = document.lines().collect();

        let h1_count = lines.iter().filter(|l| l.starts_with("# ")).count();
        if h1_count != 1 {
            violations.push(format!(
                "expected exactly one H1 line starting with '# ', found {}",
                h1_count
            ));
        }

        let section_headings: Vec<(usize, &str)> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.starts_with("## "))
            .map(|(i, l)| (i, l.trim_start_matches("## ")))
            .collect();
        if section_headings.is_empty() {
            violations.push("no link-list section present".to_string());
        }

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;

            if line.starts_with("- [") {
                if !LINK_LINE_RE.is_match(line) {
                    violations.push(format!(
                        "line {}: malformed link line, expected '- [title](url): description'",
                        line_no
                    ));
                } else if strict_mode && !LINK_LINE_STRICT_RE.is_match(line) {
                    violations.push(format!("line {}: link line missing description", line_no));
                }
            }

            if strict_mode && line.chars().count() > MAX_LINE_LEN {
                violations.push(format!(
                    "line {}: exceeds {} character limit",
                    line_no, MAX_LINE_LEN
                ));
            }
        }

        // 分组空缺检查：严格模式要求Docs存在且非空
        let mut docs_present = false;
        for (pos, (line_idx, heading)) in section_headings.iter().enumerate() {
            let end = section_headings
                .get(pos + 1)
                .map(|(next_idx, _)| *next_idx)
                .unwrap_or(lines.len());
            let entry_count = lines[line_idx + 1..end]
                .iter()
                .filter(|l| l.starts_with("- "))
                .count();

            if *heading == "Docs" {
                docs_present = true;
            }

            if entry_count == 0 {
                let msg = format!("section '{}' contains no entries", heading);
                if strict_mode {
                    violations.push(msg);
                } else {
                    warnings.push(msg);
                }
            }
        }

        if strict_mode && !docs_present {
            violations.push("strict mode requires a non-empty Docs section".to_string());
        }

        ValidationReport {
            ok: violations.is_empty(),
            violations,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::summary::{SectionHint, SummaryEntry};
    use crate::domain::services::compose_service::ComposeService;

    const VALID_DOC: &str = "# Example\n\n> An example site.\n\n## Docs\n- [Home](https://e.com/): Landing page.\n\n## Policies\n- [Terms](https://e.com/tos): Legal terms.\n";

    #[test]
    fn test_valid_document_passes_strict() {
        let report = ValidateService::validate(VALID_DOC, true);
        assert!(report.ok, "violations: {:?}", report.violations);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_missing_h1_fails() {
        let doc = "## Docs\n- [Home](https://e.com/): Landing.\n";
        let report = ValidateService::validate(doc, false);
        assert!(!report.ok);
        assert!(report.violations.iter().any(|v| v.contains("H1")));
    }

    #[test]
    fn test_multiple_h1_fails() {
        let doc = "# One\n# Two\n\n## Docs\n- [Home](https://e.com/): x.\n";
        let report = ValidateService::validate(doc, false);
        assert!(!report.ok);
        assert!(report.violations.iter().any(|v| v.contains("found 2")));
    }

    #[test]
    fn test_no_sections_fails() {
        let doc = "# Example\n\n> Site.\n";
        let report = ValidateService::validate(doc, false);
        assert!(!report.ok);
        assert!(report
            .violations
            .iter()
            .any(|v| v.contains("no link-list section")));
    }

    #[test]
    fn test_malformed_link_line_fails() {
        let doc = "# Example\n\n## Docs\n- [broken](no spaces allowed: x\n";
        let report = ValidateService::validate(doc, false);
        assert!(!report.ok);
        assert!(report
            .violations
            .iter()
            .any(|v| v.contains("line 4") && v.contains("malformed")));
    }

    #[test]
    fn test_strict_mode_requires_description() {
        let doc = "# Example\n\n## Docs\n- [Home](https://e.com/):\n";

        let strict = ValidateService::validate(doc, true);
        assert!(!strict.ok);
        assert!(strict
            .violations
            .iter()
            .any(|v| v.contains("line 4") && v.contains("missing description")));

        let lenient = ValidateService::validate(doc, false);
        assert!(lenient.ok, "violations: {:?}", lenient.violations);
    }

    #[test]
    fn test_strict_mode_line_length_ceiling() {
        let long_desc = "x".repeat(600);
        let doc = format!(
            "# Example\n\n## Docs\n- [Home](https://e.com/): {}\n",
            long_desc
        );

        let strict = ValidateService::validate(&doc, true);
        assert!(!strict.ok);
        assert!(strict
            .violations
            .iter()
            .any(|v| v.contains("character limit")));

        let lenient = ValidateService::validate(&doc, false);
        assert!(lenient.ok);
    }

    #[test]
    fn test_strict_mode_requires_docs_section() {
        let doc = "# Example\n\n## Policies\n- [Terms](https://e.com/tos): Legal.\n";

        let strict = ValidateService::validate(doc, true);
        assert!(!strict.ok);
        assert!(strict
            .violations
            .iter()
            .any(|v| v.contains("Docs section")));
    }

    #[test]
    fn test_composed_documents_validate_round_trip() {
        let entries = vec![
            SummaryEntry {
                url: "https://e.com/".to_string(),
                section_hint: SectionHint::Docs,
                title: "Home".to_string(),
                description: "Landing page.".to_string(),
            },
            SummaryEntry {
                url: "https://e.com/tos".to_string(),
                section_hint: SectionHint::Policies,
                title: "Terms".to_string(),
                description: "Legal terms.".to_string(),
            },
            SummaryEntry {
                url: "https://e.com/blog".to_string(),
                section_hint: SectionHint::Optional,
                title: "Blog".to_string(),
                description: "Posts.".to_string(),
            },
        ];
        let notes = vec!["Generated from 3 pages on e.com".to_string()];
        let doc = ComposeService::compose("Example", "An example site.", &notes, &entries, true);

        let report = ValidateService::validate(&doc, true);
        assert!(report.ok, "violations: {:?}", report.violations);
    }

    #[test]
    fn test_empty_section_is_warning_when_lenient() {
        let doc = "# Example\n\n## Docs\n- [Home](https://e.com/): x.\n\n## Policies\n";

        let lenient = ValidateService::validate(doc, false);
        assert!(lenient.ok);
        assert!(lenient.warnings.iter().any(|w| w.contains("Policies")));

        let strict = ValidateService::validate(doc, true);
        assert!(!strict.ok);
    }
}
