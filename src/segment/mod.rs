//! Family-specific document segmenters.
//!
//! Each segmenter is a pure function from raw text to passage drafts plus
//! the warnings for any sections it had to skip. The dispatcher here owns
//! the cross-family invariants: it attaches source file, collection, and
//! contiguous 1-based sequence numbers, and drops (with a warning) any
//! draft whose text ends up empty — a segmenter must never emit one, but
//! the invariant is enforced in exactly one place.

mod avatar;
mod practice;
mod protocol;
mod semantic;
mod tactics;

pub use practice::blocker_types;

use crate::config::ChunkingConfig;
use crate::models::{estimate_tokens, DocumentFamily, ParseWarning, Passage, SourceDocument};

/// Segment one source document into passages.
///
/// Warnings from the family segmenter are appended to `warnings`. Never
/// fails: unparseable sections are skipped, not raised.
pub fn segment_document(
    doc: &SourceDocument,
    chunking: &ChunkingConfig,
    file_number: Option<i64>,
    warnings: &mut Vec<ParseWarning>,
) -> Vec<Passage> {
    let (drafts, mut family_warnings) = match doc.family {
        DocumentFamily::Tactics => tactics::segment(&doc.text),
        DocumentFamily::Protocol => protocol::segment(&doc.text),
        DocumentFamily::Avatar => avatar::segment(&doc.text),
        DocumentFamily::Practice => practice::segment(&doc.text),
        DocumentFamily::Qa | DocumentFamily::Webinar | DocumentFamily::Narrative => {
            semantic::segment(&doc.text, doc.family, chunking)
        }
    };

    for w in &mut family_warnings {
        w.source_file = doc.file.clone();
    }
    warnings.extend(family_warnings);

    let mut passages = Vec::with_capacity(drafts.len());
    let mut sequence = 0i64;

    for draft in drafts {
        let text = draft.text.trim().to_string();
        if text.is_empty() {
            warnings.push(ParseWarning {
                source_file: doc.file.clone(),
                line: 0,
                reason: format!("segmenter for '{}' produced an empty passage", doc.file),
            });
            continue;
        }

        sequence += 1;
        passages.push(Passage {
            source_file: doc.file.clone(),
            tokens_approx: estimate_tokens(&text),
            text,
            category: draft.category,
            subcategory: draft.subcategory,
            sequence_number: sequence,
            applicable_patterns: draft.applicable_patterns,
            applicable_contexts: draft.applicable_contexts,
            applicable_practice_types: draft.applicable_practice_types,
            priority_level: draft.priority_level,
            collection: doc.collection.clone(),
            file_number,
            metadata: draft.metadata,
            embedding: None,
        });
    }

    passages
}

/// Split `text` into sections, each starting at a line for which
/// `is_heading` returns true. Content before the first heading is returned
/// as a preamble section with `heading = None`. Sections carry the 1-based
/// line number they start at, for warning context.
pub(crate) struct Section<'a> {
    pub heading: Option<&'a str>,
    pub body: Vec<&'a str>,
    pub start_line: usize,
}

pub(crate) fn split_sections<'a>(
    text: &'a str,
    is_heading: impl Fn(&str) -> bool,
) -> Vec<Section<'a>> {
    let mut sections: Vec<Section<'a>> = Vec::new();
    let mut current: Option<Section<'a>> = None;

    for (idx, line) in text.lines().enumerate() {
        if is_heading(line) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(Section {
                heading: Some(line),
                body: Vec::new(),
                start_line: idx + 1,
            });
        } else {
            match &mut current {
                Some(section) => section.body.push(line),
                None => {
                    current = Some(Section {
                        heading: None,
                        body: vec![line],
                        start_line: idx + 1,
                    });
                }
            }
        }
    }

    if let Some(section) = current {
        sections.push(section);
    }

    sections
}
