//! Core data models used throughout the ingestion pipeline.
//!
//! These types represent the source documents, passages, and run results
//! that flow from the loader through the segmenters to the sink.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Document family, selecting which segmenter applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFamily {
    Tactics,
    Qa,
    Webinar,
    Narrative,
    Protocol,
    Avatar,
    Practice,
}

impl DocumentFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFamily::Tactics => "tactics",
            DocumentFamily::Qa => "qa",
            DocumentFamily::Webinar => "webinar",
            DocumentFamily::Narrative => "narrative",
            DocumentFamily::Protocol => "protocol",
            DocumentFamily::Avatar => "avatar",
            DocumentFamily::Practice => "practice",
        }
    }
}

/// A raw source document loaded from the content root. Immutable for the
/// duration of one pipeline run.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// File name relative to the content root (the document identifier).
    pub file: String,
    /// Absolute path the text was read from.
    pub path: PathBuf,
    pub family: DocumentFamily,
    /// Primary destination collection for passages from this document.
    pub collection: String,
    pub text: String,
}

/// Passage fields produced by a family segmenter. Source file, collection,
/// and sequence numbers are attached by the dispatcher.
#[derive(Debug, Clone)]
pub struct PassageDraft {
    pub text: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub applicable_patterns: Vec<String>,
    pub applicable_contexts: Vec<String>,
    pub applicable_practice_types: Vec<String>,
    pub priority_level: i64,
    /// Family-specific extras (week number, tactic id, blocker types, ...).
    pub metadata: serde_json::Value,
}

impl PassageDraft {
    pub fn new(text: String, category: &str) -> Self {
        PassageDraft {
            text,
            category: category.to_string(),
            subcategory: None,
            applicable_patterns: Vec::new(),
            applicable_contexts: Vec::new(),
            applicable_practice_types: Vec::new(),
            priority_level: 1,
            metadata: serde_json::json!({}),
        }
    }
}

/// The unit of retrieval: a chunk of text with its classification metadata
/// and, once the embedding client has run, its vector.
#[derive(Debug, Clone)]
pub struct Passage {
    pub source_file: String,
    pub text: String,
    pub category: String,
    pub subcategory: Option<String>,
    /// 1-based position within the source file. Unique and contiguous.
    pub sequence_number: i64,
    /// Crude estimate: `ceil(len/4)`. Reporting only, not a tokenizer count.
    pub tokens_approx: i64,
    pub applicable_patterns: Vec<String>,
    pub applicable_contexts: Vec<String>,
    pub applicable_practice_types: Vec<String>,
    pub priority_level: i64,
    /// Destination collection. Routing may copy or move a passage to a
    /// secondary collection before embedding.
    pub collection: String,
    pub file_number: Option<i64>,
    pub metadata: serde_json::Value,
    /// `None` until the embedding client succeeds. A passage is never
    /// persisted while this is `None`.
    pub embedding: Option<Vec<f32>>,
}

impl Passage {
    /// Stable content hash used as the upsert key: re-running the pipeline
    /// on unchanged sources updates rows in place instead of duplicating.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source_file.as_bytes());
        hasher.update(self.sequence_number.to_le_bytes());
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Approximate token count: `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> i64 {
    (text.len() as i64 + 3) / 4
}

/// A section a segmenter could not parse and skipped. Collected into the
/// run report so content gaps are discoverable rather than invisible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseWarning {
    pub source_file: String,
    /// Approximate 1-based line where the skipped section starts.
    pub line: usize,
    pub reason: String,
}

/// Identity and cause of one failed passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageFailure {
    pub source_file: String,
    pub sequence_number: i64,
    /// Which stage failed: `"embed"` or `"insert"`.
    pub stage: String,
    pub message: String,
}

/// Result of one ingestion run. Serialized to disk so a later invocation
/// can retry just the failed subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: i64,
    pub finished_at: i64,
    pub total_passages: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Passages not attempted because the run was cancelled.
    pub skipped: u64,
    pub cancelled: bool,
    pub failures: Vec<PassageFailure>,
    pub warnings: Vec<ParseWarning>,
}

impl RunReport {
    pub fn record_failure(&mut self, passage: &Passage, stage: &str, message: String) {
        self.failed += 1;
        self.failures.push(PassageFailure {
            source_file: passage.source_file.clone(),
            sequence_number: passage.sequence_number,
            stage: stage.to_string(),
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_content_hash_stable_across_runs() {
        let p = passage("notes.txt", 3, "grounding exercise");
        assert_eq!(p.content_hash(), p.content_hash());
    }

    #[test]
    fn test_content_hash_distinguishes_sequence() {
        let a = passage("notes.txt", 1, "same text");
        let b = passage("notes.txt", 2, "same text");
        assert_ne!(a.content_hash(), b.content_hash());
    }

    fn passage(file: &str, seq: i64, text: &str) -> Passage {
        Passage {
            source_file: file.to_string(),
            text: text.to_string(),
            category: "tactic".to_string(),
            subcategory: None,
            sequence_number: seq,
            tokens_approx: estimate_tokens(text),
            applicable_patterns: vec![],
            applicable_contexts: vec![],
            applicable_practice_types: vec![],
            priority_level: 1,
            collection: "coaching".to_string(),
            file_number: None,
            metadata: serde_json::json!({}),
            embedding: None,
        }
    }
}
