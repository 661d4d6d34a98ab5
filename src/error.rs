//! Error taxonomy for the ingestion pipeline.
//!
//! Two kinds of failure exist here and they are never mixed up:
//!
//! - **Fatal pre-flight errors** ([`IngestError`]) abort the run before any
//!   passage is touched: a required source file is missing, or a credential
//!   is absent. These map to exit code 2.
//! - **Per-passage errors** ([`EmbedError`], [`SinkError`]) are recorded in
//!   the run report and the loop continues — one flaky API call never loses
//!   the rest of the batch. A run with any of these exits 1.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal pre-flight errors. Nothing has been embedded or written when one
/// of these is raised.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source document not found: {}", file.display())]
    DocumentNotFound { file: PathBuf },

    #[error("required environment variable not set: {0}")]
    MissingCredential(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Per-passage embedding failure. Carried into the run report together with
/// the passage's source file and sequence number.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("embeddings API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed embeddings response: {0}")]
    Malformed(String),

    #[error("retries exhausted: {0}")]
    RetriesExhausted(String),

    #[error("embedding provider is disabled")]
    Disabled,
}

/// Per-passage persistence failure. Each insert is independent; a rejected
/// row never blocks subsequent inserts.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("passage has no embedding vector")]
    MissingEmbedding,
}
