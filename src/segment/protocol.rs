//! Protocol segmenter.
//!
//! A protocol document groups intervention practices under `##` headings of
//! the form `pattern + temperament`:
//!
//! ```text
//! ## burnout + warrior
//! When intensity turns against you.
//! Practice: 60-second cold reset
//! Step outside, ...
//! Practice: conquest journaling
//! Write down ...
//! ```
//!
//! Each `Practice` sub-unit becomes one passage tagged with the section's
//! pattern and temperament. A heading that does not match `word + word` is
//! skipped — with a warning, so the gap is visible in the run report.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{ParseWarning, PassageDraft};

use super::split_sections;

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^##\s+([A-Za-z_]+)\s*\+\s*([A-Za-z_]+)\s*$").unwrap())
}

pub fn segment(text: &str) -> (Vec<PassageDraft>, Vec<ParseWarning>) {
    let mut drafts = Vec::new();
    let mut warnings = Vec::new();

    let sections = split_sections(text, |line| line.starts_with("## "));

    for section in sections {
        let heading = match section.heading {
            Some(h) => h,
            None => continue, // preamble before the first heading carries no practices
        };

        let caps = match heading_re().captures(heading.trim_end()) {
            Some(c) => c,
            None => {
                warnings.push(ParseWarning {
                    source_file: String::new(),
                    line: section.start_line,
                    reason: format!(
                        "heading '{}' does not match 'pattern + temperament'; section skipped",
                        heading.trim()
                    ),
                });
                continue;
            }
        };

        let pattern = caps.get(1).unwrap().as_str().to_lowercase();
        let temperament = caps.get(2).unwrap().as_str().to_lowercase();

        for unit in practice_units(&section.body) {
            let mut draft = PassageDraft::new(unit, "protocol");
            draft.subcategory = Some(pattern.clone());
            draft.applicable_patterns = vec![pattern.clone()];
            draft.applicable_contexts = vec![temperament.clone()];
            draft.applicable_practice_types = vec!["R".to_string(), "O".to_string()];
            draft.priority_level = 1;
            draft.metadata = serde_json::json!({
                "pattern": pattern,
                "temperament": temperament,
            });
            drafts.push(draft);
        }
    }

    (drafts, warnings)
}

/// Sub-split a section body on `Practice` delimiter lines. Text before the
/// first delimiter stays attached to the first practice so section context
/// is not lost; a section with no delimiter at all yields one unit.
fn practice_units(body: &[&str]) -> Vec<String> {
    let mut units: Vec<Vec<&str>> = Vec::new();
    let mut intro: Vec<&str> = Vec::new();

    for line in body {
        if line.trim_start().starts_with("Practice") {
            units.push(vec![line]);
        } else if let Some(current) = units.last_mut() {
            current.push(line);
        } else {
            intro.push(line);
        }
    }

    if units.is_empty() {
        let text = intro.join("\n").trim().to_string();
        return if text.is_empty() { Vec::new() } else { vec![text] };
    }

    let intro_text = intro.join("\n").trim().to_string();
    units
        .into_iter()
        .enumerate()
        .filter_map(|(i, lines)| {
            let unit = lines.join("\n").trim().to_string();
            if unit.is_empty() {
                None
            } else if i == 0 && !intro_text.is_empty() {
                Some(format!("{intro_text}\n{unit}"))
            } else {
                Some(unit)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
## burnout + warrior
When intensity turns against you.
Practice: 60-second cold reset
Step outside and breathe until the edge softens.
Practice: conquest journaling
Write the day's one battle worth fighting.

## comparison + sage
Practice: highlight-reel audit
List three things the feed never shows.";

    #[test]
    fn test_practices_become_passages() {
        let (drafts, warnings) = segment(DOC);
        assert_eq!(drafts.len(), 3);
        assert!(warnings.is_empty());
        assert_eq!(drafts[0].applicable_patterns, vec!["burnout"]);
        assert_eq!(drafts[0].applicable_contexts, vec!["warrior"]);
        assert_eq!(drafts[2].applicable_patterns, vec!["comparison"]);
        for d in &drafts {
            assert_eq!(d.applicable_practice_types, vec!["R", "O"]);
            assert_eq!(d.priority_level, 1);
        }
    }

    #[test]
    fn test_intro_attached_to_first_practice() {
        let (drafts, _) = segment(DOC);
        assert!(drafts[0].text.starts_with("When intensity"));
        assert!(drafts[0].text.contains("cold reset"));
        assert!(!drafts[1].text.contains("When intensity"));
    }

    #[test]
    fn test_malformed_heading_skipped_with_warning() {
        let doc = "## General notes\nPractice: something\nDetails.";
        let (drafts, warnings) = segment(doc);
        assert!(drafts.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].reason.contains("General notes"));
        assert_eq!(warnings[0].line, 1);
    }

    #[test]
    fn test_malformed_section_does_not_poison_rest() {
        let doc = format!("## stray heading\nText.\n\n{DOC}");
        let (drafts, warnings) = segment(&doc);
        assert_eq!(drafts.len(), 3);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_section_without_practice_yields_one_unit() {
        let doc = "## burnout + builder\nJust a description, no delimiter.";
        let (drafts, _) = segment(doc);
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].text.contains("description"));
    }
}
