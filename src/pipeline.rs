//! Ingestion pipeline orchestration.
//!
//! Drives the full run: load source documents, segment into passages, route
//! financing content, then embed and persist each passage in turn. The run
//! is strictly sequential — one in-flight embedding call, one in-flight
//! write — and strictly forward through its states:
//!
//! ```text
//! Idle -> Loading -> Segmenting -> EmbeddingPersisting -> Done
//! ```
//!
//! Per-passage failures are recorded in the [`RunReport`] and the loop
//! continues; only a missing source document or credential aborts the run.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::IngestError;
use crate::loader;
use crate::models::{ParseWarning, Passage, RunReport};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::route;
use crate::segment;
use crate::sink;

/// How often the embedding phase emits a progress event.
const PROGRESS_EVERY: u64 = 25;

/// Pipeline state. Transitions are forward-only; there is no retry of a
/// whole state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Loading,
    Segmenting,
    EmbeddingPersisting,
    Done,
}

impl RunState {
    fn advance(self) -> RunState {
        match self {
            RunState::Idle => RunState::Loading,
            RunState::Loading => RunState::Segmenting,
            RunState::Segmenting => RunState::EmbeddingPersisting,
            RunState::EmbeddingPersisting => RunState::Done,
            RunState::Done => RunState::Done,
        }
    }
}

pub struct IngestOptions {
    pub limit: Option<usize>,
    /// When set, only the listed (source_file, sequence_number) passages
    /// are processed — the failure subset of a previous run.
    pub retry_filter: Option<HashSet<(String, i64)>>,
    /// Checked between passages; a cancelled run finishes the in-flight
    /// passage, reports partial counts, and stops.
    pub shutdown: Arc<AtomicBool>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestOptions {
            limit: None,
            retry_filter: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Load, segment, and route — everything that happens before the first
/// embedding call. Shared by real runs and `--dry-run`.
pub fn plan(
    config: &Config,
    progress: &dyn ProgressReporter,
) -> Result<(Vec<Passage>, Vec<ParseWarning>), IngestError> {
    progress.report(ProgressEvent::Loading {
        total_files: config.sources.documents.len(),
    });
    let documents = loader::load_documents(config)?;

    let mut warnings = Vec::new();
    let mut passages = Vec::new();

    for doc in &documents {
        progress.report(ProgressEvent::Segmenting {
            file: doc.file.clone(),
        });
        let file_number = config
            .sources
            .documents
            .iter()
            .find(|d| d.file == doc.file)
            .and_then(|d| d.file_number);
        passages.extend(segment::segment_document(
            doc,
            &config.chunking,
            file_number,
            &mut warnings,
        ));
    }

    let passages = route::route_passages(passages, &config.routing);
    Ok((passages, warnings))
}

/// Run the full pipeline: plan, then embed and persist every passage.
pub async fn run_pipeline(
    config: &Config,
    pool: &SqlitePool,
    embedder: &dyn Embedder,
    progress: &dyn ProgressReporter,
    opts: IngestOptions,
) -> Result<RunReport, IngestError> {
    let mut state = RunState::Idle;
    let mut report = RunReport {
        started_at: chrono::Utc::now().timestamp(),
        ..Default::default()
    };

    state = state.advance(); // Loading
    debug_assert_eq!(state, RunState::Loading);
    state = state.advance(); // Segmenting
    let (mut passages, warnings) = plan(config, progress)?;
    report.warnings = warnings;

    if let Some(filter) = &opts.retry_filter {
        passages.retain(|p| filter.contains(&(p.source_file.clone(), p.sequence_number)));
    }
    if let Some(limit) = opts.limit {
        passages.truncate(limit);
    }

    report.total_passages = passages.len() as u64;

    state = state.advance();
    debug_assert_eq!(state, RunState::EmbeddingPersisting);

    let total = passages.len() as u64;
    let mut processed = 0u64;

    for mut passage in passages {
        if opts.shutdown.load(Ordering::Relaxed) {
            report.cancelled = true;
            report.skipped = total - processed;
            break;
        }

        match embedder.embed(&passage.text).await {
            Ok(vector) => {
                passage.embedding = Some(vector);
                match sink::insert_passage(pool, &passage).await {
                    Ok(()) => report.succeeded += 1,
                    Err(e) => report.record_failure(&passage, "insert", e.to_string()),
                }
            }
            Err(e) => report.record_failure(&passage, "embed", e.to_string()),
        }

        processed += 1;
        if processed % PROGRESS_EVERY == 0 || processed == total {
            progress.report(ProgressEvent::Embedding {
                n: processed,
                total,
            });
        }
    }

    state = state.advance();
    debug_assert_eq!(state, RunState::Done);
    report.finished_at = chrono::Utc::now().timestamp();
    Ok(report)
}

/// Write the run report JSON to disk (for `--retry-failed-from`).
pub fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run report: {}", path.display()))?;
    Ok(())
}

/// Load the failure subset of a previous run report.
pub fn load_retry_filter(path: &Path) -> Result<HashSet<(String, i64)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run report: {}", path.display()))?;
    let report: RunReport =
        serde_json::from_str(&content).with_context(|| "Failed to parse run report")?;
    Ok(report
        .failures
        .iter()
        .map(|f| (f.source_file.clone(), f.sequence_number))
        .collect())
}
