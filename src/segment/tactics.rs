//! Tactics segmenter.
//!
//! A tactics document is a numbered list of units, one per tactic:
//!
//! ```text
//! T014: Two-minute rule for stalled tasks
//! Week: 3
//! Category: procrastination
//! When a task has been open for more than a day, ...
//! ```
//!
//! One passage per `T###:` unit. Units whose header fails the pattern are
//! skipped with a warning.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{ParseWarning, PassageDraft};

use super::split_sections;

fn unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(T\d{3}):\s*(.+)$").unwrap())
}

fn field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(Week|Category):\s*(.+)$").unwrap())
}

pub fn segment(text: &str) -> (Vec<PassageDraft>, Vec<ParseWarning>) {
    let mut drafts = Vec::new();
    let mut warnings = Vec::new();

    let sections = split_sections(text, |line| unit_re().is_match(line.trim_end()));

    for section in sections {
        let heading = match section.heading {
            Some(h) => h.trim_end(),
            None => {
                if section.body.iter().any(|l| !l.trim().is_empty()) {
                    warnings.push(ParseWarning {
                        source_file: String::new(),
                        line: section.start_line,
                        reason: "text before the first tactic unit was skipped".to_string(),
                    });
                }
                continue;
            }
        };

        // split_sections only opens a section on a matching heading
        let caps = unit_re().captures(heading).unwrap();
        let tactic_id = caps.get(1).unwrap().as_str().to_string();
        let title = caps.get(2).unwrap().as_str().trim().to_string();

        let mut week_number: Option<i64> = None;
        let mut tactic_category: Option<String> = None;
        let mut body_lines: Vec<&str> = vec![heading];

        for line in &section.body {
            if let Some(field) = field_re().captures(line.trim()) {
                let value = field.get(2).unwrap().as_str().trim();
                match field.get(1).unwrap().as_str().to_ascii_lowercase().as_str() {
                    "week" => week_number = value.parse().ok(),
                    "category" => tactic_category = Some(value.to_string()),
                    _ => {}
                }
            }
            body_lines.push(line);
        }

        let text = body_lines.join("\n").trim().to_string();

        let mut draft = PassageDraft::new(text, "tactic");
        draft.subcategory = tactic_category.clone();
        draft.priority_level = 1;
        draft.metadata = serde_json::json!({
            "tactic_id": tactic_id,
            "title": title,
            "week_number": week_number,
            "tactic_category": tactic_category,
        });
        drafts.push(draft);
    }

    (drafts, warnings)
}
