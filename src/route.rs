//! Financing content filter / router.
//!
//! Some passages written for the coaching audience are really about money:
//! loans, lenders, down payments. Those also belong in the financing
//! knowledge base. The router is a pure, deterministic, case-insensitive
//! keyword filter; whether a match is *copied* to the secondary collection
//! or *moved* there exclusively is an explicit config flag.

use crate::config::{RoutingConfig, RoutingMode};
use crate::models::Passage;

/// Built-in financing keyword list. Overridable via `routing.keywords`.
const FINANCING_KEYWORDS: &[&str] = &[
    "financing",
    "finance",
    "loan",
    "lender",
    "lending",
    "mortgage",
    "down payment",
    "credit score",
    "credit line",
    "line of credit",
    "interest rate",
    "underwriting",
    "appraisal",
    "escrow",
    "refinance",
    "collateral",
    "amortization",
    "apr",
    "closing costs",
    "pre-approval",
    "preapproval",
    "debt",
    "equity",
    "grant money",
    "subsidy",
    "hud",
    "fha",
    "seller carry",
    "hard money",
    "private money",
    "funding",
];

/// True when the passage text contains at least one financing keyword,
/// in any casing.
pub fn matches_financing(text: &str, config: &RoutingConfig) -> bool {
    let lower = text.to_lowercase();
    match &config.keywords {
        Some(keywords) => keywords.iter().any(|k| lower.contains(&k.to_lowercase())),
        None => FINANCING_KEYWORDS.iter().any(|k| lower.contains(k)),
    }
}

/// Apply routing to the full passage list.
///
/// In `copy` mode a matching passage is duplicated into the secondary
/// collection and also keeps its primary row; in `move` mode its collection
/// is rewritten. Passages already destined for the secondary collection are
/// left alone. Order is preserved: a copy is inserted directly after its
/// primary.
pub fn route_passages(passages: Vec<Passage>, config: &RoutingConfig) -> Vec<Passage> {
    let mut routed = Vec::with_capacity(passages.len());

    for mut passage in passages {
        if passage.collection == config.secondary_collection
            || !matches_financing(&passage.text, config)
        {
            routed.push(passage);
            continue;
        }

        match config.mode {
            RoutingMode::Move => {
                passage.collection = config.secondary_collection.clone();
                routed.push(passage);
            }
            RoutingMode::Copy => {
                let mut copy = passage.clone();
                copy.collection = config.secondary_collection.clone();
                routed.push(passage);
                routed.push(copy);
            }
        }
    }

    routed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::estimate_tokens;

    fn passage(text: &str, collection: &str) -> Passage {
        Passage {
            source_file: "tactics.txt".to_string(),
            text: text.to_string(),
            category: "tactic".to_string(),
            subcategory: None,
            sequence_number: 1,
            tokens_approx: estimate_tokens(text),
            applicable_patterns: vec![],
            applicable_contexts: vec![],
            applicable_practice_types: vec![],
            priority_level: 1,
            collection: collection.to_string(),
            file_number: None,
            metadata: serde_json::json!({}),
            embedding: None,
        }
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let cfg = RoutingConfig::default();
        assert!(matches_financing("FINANCING options for the home", &cfg));
        assert!(matches_financing("Financing options", &cfg));
        assert!(matches_financing("talk to your lender first", &cfg));
        assert!(!matches_financing("morning breathing practice", &cfg));
    }

    #[test]
    fn test_copy_mode_duplicates_row() {
        let cfg = RoutingConfig::default();
        let routed = route_passages(
            vec![
                passage("ask about the Interest Rate early", "coaching"),
                passage("two-minute grounding reset", "coaching"),
            ],
            &cfg,
        );
        assert_eq!(routed.len(), 3);
        assert_eq!(routed[0].collection, "coaching");
        assert_eq!(routed[1].collection, "financing");
        assert_eq!(routed[0].text, routed[1].text);
        assert_eq!(routed[2].collection, "coaching");
    }

    #[test]
    fn test_move_mode_rewrites_collection() {
        let cfg = RoutingConfig {
            mode: RoutingMode::Move,
            ..Default::default()
        };
        let routed = route_passages(vec![passage("down payment math", "coaching")], &cfg);
        assert_eq!(routed.len(), 1);
        assert_eq!(routed[0].collection, "financing");
    }

    #[test]
    fn test_already_secondary_untouched() {
        let cfg = RoutingConfig::default();
        let routed = route_passages(vec![passage("loan terms explained", "financing")], &cfg);
        assert_eq!(routed.len(), 1);
        assert_eq!(routed[0].collection, "financing");
    }

    #[test]
    fn test_keyword_override() {
        let cfg = RoutingConfig {
            keywords: Some(vec!["Zoning".to_string()]),
            ..Default::default()
        };
        assert!(matches_financing("check the zoning board", &cfg));
        assert!(!matches_financing("talk to your lender", &cfg));
    }
}
