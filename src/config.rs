use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::DocumentFamily;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    /// Directory the expected source documents are read from.
    pub root: PathBuf,
    pub documents: Vec<SourceDocumentConfig>,
}

/// One expected source document. A missing file is fatal to the whole run.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceDocumentConfig {
    pub file: String,
    pub family: DocumentFamily,
    pub collection: String,
    /// Optional knowledge-base file number stamped onto every passage.
    #[serde(default)]
    pub file_number: Option<i64>,
}

/// Sizing for the semantic (qa / webinar / narrative) segmenter.
#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_target_tokens")]
    pub target_tokens: i64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,
    #[serde(default = "default_overlap_lines")]
    pub overlap_lines: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        ChunkingConfig {
            target_tokens: default_target_tokens(),
            max_tokens: default_max_tokens(),
            overlap_lines: default_overlap_lines(),
        }
    }
}

fn default_target_tokens() -> i64 {
    450
}
fn default_max_tokens() -> i64 {
    500
}
fn default_overlap_lines() -> usize {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Minimum gap between consecutive request starts, in milliseconds.
    /// Enforced unconditionally, success or failure.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            min_interval_ms: default_min_interval_ms(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_min_interval_ms() -> u64 {
    350
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

/// What happens to a passage the financing filter matches.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// Insert into the secondary collection in addition to the primary one.
    Copy,
    /// Insert into the secondary collection instead of the primary one.
    Move,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    #[serde(default = "default_routing_mode")]
    pub mode: RoutingMode,
    #[serde(default = "default_secondary_collection")]
    pub secondary_collection: String,
    /// Overrides the built-in financing keyword list when set.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            mode: default_routing_mode(),
            secondary_collection: default_secondary_collection(),
            keywords: None,
        }
    }
}

fn default_routing_mode() -> RoutingMode {
    RoutingMode::Copy
}
fn default_secondary_collection() -> String {
    "financing".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    /// Where `kbi ingest` writes its run report JSON. Optional.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.sources.documents.is_empty() {
        anyhow::bail!("sources.documents must list at least one source file");
    }

    if config.chunking.max_tokens <= 0 {
        anyhow::bail!("chunking.max_tokens must be > 0");
    }
    if config.chunking.target_tokens <= 0 || config.chunking.target_tokens > config.chunking.max_tokens
    {
        anyhow::bail!("chunking.target_tokens must be in 1..=chunking.max_tokens");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    if let Some(keywords) = &config.routing.keywords {
        if keywords.is_empty() {
            anyhow::bail!("routing.keywords must not be empty when set");
        }
    }

    Ok(config)
}
