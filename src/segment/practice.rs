//! Practice-library segmenter.
//!
//! Practices live under `####` headings. This segmenter does not
//! discriminate by content: every practice gets the full practice-type tag
//! set, and retrieval filtering relies on the blocker-type tags derived
//! from the unit's text.

use crate::models::{ParseWarning, PassageDraft};

use super::split_sections;

/// The seven fixed blocker categories and their trigger keywords. Matching
/// is lowercase substring containment; a unit may hit several or none.
const BLOCKER_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "procrastination",
        &["procrastinat", "putting off", "putting it off", "avoidance", "stalling"],
    ),
    ("anxiety", &["anxiety", "anxious", "worry", "panic", "dread"]),
    (
        "energy_crash",
        &["energy crash", "exhausted", "exhaustion", "fatigue", "depleted", "drained"],
    ),
    (
        "identity_collision",
        &["identity", "impostor", "imposter", "not who i am", "fraud"],
    ),
    (
        "focus_issues",
        &["focus", "distract", "scattered", "attention", "can't concentrate"],
    ),
    (
        "comparison",
        &["comparison", "comparing", "everyone else", "highlight reel"],
    ),
    (
        "motivation_collapse",
        &["motivation", "unmotivated", "pointless", "why bother", "lost the why"],
    ),
];

/// Every practice applies to every practice type; discrimination happens by
/// source family, not content.
const ALL_PRACTICE_TYPES: &[&str] = &["P", "R", "O", "T", "E", "C", "T2"];

/// Derive blocker-type tags from a unit's text. Pure and deterministic:
/// the same text always yields the same sorted tag set.
pub fn blocker_types(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tags: Vec<String> = BLOCKER_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(name, _)| name.to_string())
        .collect();
    tags.sort();
    tags
}

pub fn segment(text: &str) -> (Vec<PassageDraft>, Vec<ParseWarning>) {
    let mut drafts = Vec::new();
    let mut warnings = Vec::new();

    let sections = split_sections(text, |line| line.starts_with("#### "));

    for section in sections {
        let heading = match section.heading {
            Some(h) => h,
            None => {
                if section.body.iter().any(|l| !l.trim().is_empty()) {
                    warnings.push(ParseWarning {
                        source_file: String::new(),
                        line: section.start_line,
                        reason: "text before the first practice heading was skipped".to_string(),
                    });
                }
                continue;
            }
        };

        let title = heading.trim_start_matches('#').trim().to_string();
        let unit_text = format!("{}\n{}", heading, section.body.join("\n"))
            .trim()
            .to_string();
        let tags = blocker_types(&unit_text);

        let mut draft = PassageDraft::new(unit_text, "practice");
        draft.subcategory = Some(title.clone());
        draft.applicable_practice_types =
            ALL_PRACTICE_TYPES.iter().map(|s| s.to_string()).collect();
        draft.priority_level = 1;
        draft.metadata = serde_json::json!({
            "title": title,
            "blocker_types": tags,
        });
        drafts.push(draft);
    }

    (drafts, warnings)
}
