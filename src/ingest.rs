//! The `kbi ingest` command.
//!
//! Pre-flight checks (credential, provider, retry report), Ctrl-C wiring,
//! and the human-readable run summary all live here; the actual work is
//! [`pipeline::run_pipeline`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::embedding;
use crate::migrate;
use crate::models::RunReport;
use crate::pipeline::{self, IngestOptions};
use crate::progress::ProgressMode;

pub struct IngestArgs {
    pub dry_run: bool,
    pub limit: Option<usize>,
    pub retry_failed_from: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub progress: ProgressMode,
}

/// Run an ingestion. Returns `None` for a dry run, otherwise the run
/// report; the caller maps the report onto an exit code.
pub async fn run_ingest(config: &Config, args: IngestArgs) -> Result<Option<RunReport>> {
    let reporter = args.progress.reporter();

    if args.dry_run {
        let (passages, warnings) = pipeline::plan(config, reporter.as_ref())?;
        print_plan(config, &passages, &warnings);
        return Ok(None);
    }

    if !config.embedding.is_enabled() {
        anyhow::bail!(
            "embedding.provider is 'disabled' — configure a provider or use --dry-run"
        );
    }

    // Fails before any document is read if the credential is missing.
    let embedder = embedding::create_embedder(&config.embedding)?;

    let retry_filter = match &args.retry_failed_from {
        Some(path) => {
            let filter = pipeline::load_retry_filter(path)?;
            if filter.is_empty() {
                println!("No failures recorded in {} — nothing to retry.", path.display());
                return Ok(Some(RunReport::default()));
            }
            Some(filter)
        }
        None => None,
    };

    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted — finishing current passage, then stopping.");
            flag.store(true, Ordering::Relaxed);
        }
    });

    let report = pipeline::run_pipeline(
        config,
        &pool,
        embedder.as_ref(),
        reporter.as_ref(),
        IngestOptions {
            limit: args.limit,
            retry_filter,
            shutdown,
        },
    )
    .await?;

    pool.close().await;

    print_summary(&report);

    let report_path = args.report.clone().or_else(|| config.report.path.clone());
    if let Some(path) = report_path {
        pipeline::write_report(&report, &path)?;
        println!("Run report written to {}", path.display());
    }

    Ok(Some(report))
}

/// Dry-run output: per-collection passage counts, no API calls, no writes.
fn print_plan(
    config: &Config,
    passages: &[crate::models::Passage],
    warnings: &[crate::models::ParseWarning],
) {
    let mut by_collection: HashMap<&str, usize> = HashMap::new();
    for p in passages {
        *by_collection.entry(p.collection.as_str()).or_default() += 1;
    }
    let mut rows: Vec<_> = by_collection.into_iter().collect();
    rows.sort();

    println!("Dry run — no embeddings generated, nothing written.");
    println!();
    println!("  Source files:  {}", config.sources.documents.len());
    println!("  Passages:      {}", passages.len());
    for (collection, count) in rows {
        println!("    {:<16} {}", collection, count);
    }
    if !warnings.is_empty() {
        println!();
        println!("  Warnings:");
        for w in warnings {
            println!("    {}:{}  {}", w.source_file, w.line, w.reason);
        }
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("Ingestion complete.");
    println!("  Passages:   {}", report.total_passages);
    println!("  Succeeded:  {}", report.succeeded);
    println!("  Failed:     {}", report.failed);
    if report.cancelled {
        println!("  Skipped:    {} (cancelled)", report.skipped);
    }

    if !report.failures.is_empty() {
        println!();
        println!("  Failures:");
        for f in &report.failures {
            println!(
                "    {} #{} [{}]  {}",
                f.source_file, f.sequence_number, f.stage, f.message
            );
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("  Parse warnings:");
        for w in &report.warnings {
            println!("    {}:{}  {}", w.source_file, w.line, w.reason);
        }
    }
}
