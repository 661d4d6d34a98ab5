//! Avatar segmenter.
//!
//! An avatar library file describes client archetypes under `AVATAR`
//! headings:
//!
//! ```text
//! AVATAR 3
//! The Architect: succeeds by building systems, stalls when they break
//! Primary Pattern: execution_breakdown
//! Temperament: builder
//! Long-form description ...
//! ```
//!
//! Title comes from the first colon-containing line; pattern and
//! temperament come from labeled fields and default to "unknown" when the
//! label is absent.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{ParseWarning, PassageDraft};

use super::split_sections;

fn pattern_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^Primary Pattern:\s*(.+)$").unwrap())
}

fn temperament_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^Temperament:\s*(.+)$").unwrap())
}

pub fn segment(text: &str) -> (Vec<PassageDraft>, Vec<ParseWarning>) {
    let mut drafts = Vec::new();
    let mut warnings = Vec::new();

    let sections = split_sections(text, |line| {
        line.trim_start().to_ascii_uppercase().starts_with("AVATAR")
    });

    for section in sections {
        if section.heading.is_none() {
            if section.body.iter().any(|l| !l.trim().is_empty()) {
                warnings.push(ParseWarning {
                    source_file: String::new(),
                    line: section.start_line,
                    reason: "text before the first AVATAR heading was skipped".to_string(),
                });
            }
            continue;
        }

        let body = section.body.join("\n");
        let text = format!("{}\n{}", section.heading.unwrap(), body)
            .trim()
            .to_string();
        if body.trim().is_empty() {
            warnings.push(ParseWarning {
                source_file: String::new(),
                line: section.start_line,
                reason: "AVATAR heading with empty body was skipped".to_string(),
            });
            continue;
        }

        let title = section
            .body
            .iter()
            .find(|l| l.contains(':'))
            .map(|l| l.split(':').next().unwrap_or(l).trim().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let pattern = pattern_re()
            .captures(&body)
            .map(|c| c.get(1).unwrap().as_str().trim().to_lowercase())
            .unwrap_or_else(|| "unknown".to_string());
        let temperament = temperament_re()
            .captures(&body)
            .map(|c| c.get(1).unwrap().as_str().trim().to_lowercase())
            .unwrap_or_else(|| "unknown".to_string());

        let mut draft = PassageDraft::new(text, "avatar");
        draft.subcategory = Some(title.clone());
        draft.applicable_patterns = vec![pattern.clone()];
        draft.applicable_contexts = vec![temperament.clone()];
        draft.priority_level = 2;
        draft.metadata = serde_json::json!({
            "title": title,
            "pattern": pattern,
            "temperament": temperament,
        });
        drafts.push(draft);
    }

    (drafts, warnings)
}
