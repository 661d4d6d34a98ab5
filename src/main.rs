//! # Knowledge Base Ingest CLI (`kbi`)
//!
//! The `kbi` binary drives the ingestion pipeline: database initialization,
//! source inspection, the ingestion run itself, and post-run statistics.
//!
//! ## Usage
//!
//! ```bash
//! kbi --config ./config/kbi.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kbi init` | Create the SQLite database and run schema migrations |
//! | `kbi sources` | List configured source documents and whether they exist |
//! | `kbi ingest` | Segment, embed, and persist every configured document |
//! | `kbi stats` | Per-collection and per-source passage counts |
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Run completed and every passage succeeded |
//! | 1 | Run completed but at least one passage failed, or it was cancelled |
//! | 2 | Pre-flight failure: bad config, missing source file, missing credential |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! kbi init --config ./config/kbi.toml
//!
//! # Check every expected source file is present
//! kbi sources --config ./config/kbi.toml
//!
//! # Count passages without calling the embeddings API
//! kbi ingest --dry-run --config ./config/kbi.toml
//!
//! # Full run, writing a machine-readable report
//! kbi ingest --report ./reports/run.json --config ./config/kbi.toml
//!
//! # Retry only the passages a previous run failed on
//! kbi ingest --retry-failed-from ./reports/run.json --config ./config/kbi.toml
//! ```

mod config;
mod db;
mod embedding;
mod error;
mod ingest;
mod loader;
mod migrate;
mod models;
mod pipeline;
mod progress;
mod route;
mod segment;
mod sink;
mod sources;
mod stats;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use progress::ProgressMode;

/// Knowledge Base Ingest CLI — segment, embed, and persist coaching
/// knowledge-base documents into SQLite.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/kbi.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "kbi",
    about = "Knowledge Base Ingest — chunk, embed, and persist coaching documents",
    version,
    long_about = "kb-ingest reads a fixed set of curated source documents, segments each one \
    with a family-specific strategy, routes financing-related passages to a secondary \
    collection, generates one embedding vector per passage, and persists everything to a \
    local SQLite database. Re-runs are idempotent."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/kbi.toml`. All source, database, chunking,
    /// embedding, and routing settings are read from this file.
    #[arg(long, global = true, default_value = "./config/kbi.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the passages table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// List configured source documents and their status.
    ///
    /// Shows every expected source file with its family, destination
    /// collection, and whether it exists on disk. A MISSING file would
    /// abort an ingestion run before any API call.
    Sources,

    /// Run the ingestion pipeline.
    ///
    /// Loads every configured document, segments it into passages,
    /// routes financing content, then embeds and persists each passage
    /// sequentially. Individual passage failures are recorded and do not
    /// stop the run.
    Ingest {
        /// Load and segment only — print passage counts per collection
        /// without calling the embeddings API or writing to the database.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of passages to embed and persist.
        #[arg(long)]
        limit: Option<usize>,

        /// Re-process only the passages listed as failures in a previous
        /// run's report JSON.
        #[arg(long, value_name = "REPORT")]
        retry_failed_from: Option<PathBuf>,

        /// Write the run report JSON to this path (overrides `report.path`
        /// from the config).
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,

        /// Progress output: `auto`, `human`, `json`, or `off`.
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// Show passage counts and sizes for everything ingested so far.
    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ingest {
            dry_run,
            limit,
            retry_failed_from,
            report,
            progress,
        } => {
            let progress = parse_progress_mode(&progress)?;
            let outcome = ingest::run_ingest(
                &cfg,
                ingest::IngestArgs {
                    dry_run,
                    limit,
                    retry_failed_from,
                    report,
                    progress,
                },
            )
            .await?;

            match outcome {
                Some(report) if report.failed > 0 || report.cancelled => Ok(ExitCode::from(1)),
                _ => Ok(ExitCode::SUCCESS),
            }
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn parse_progress_mode(s: &str) -> anyhow::Result<ProgressMode> {
    match s {
        "auto" => Ok(ProgressMode::default_for_tty()),
        "human" => Ok(ProgressMode::Human),
        "json" => Ok(ProgressMode::Json),
        "off" => Ok(ProgressMode::Off),
        other => anyhow::bail!(
            "Unknown progress mode: '{}'. Must be auto, human, json, or off.",
            other
        ),
    }
}
