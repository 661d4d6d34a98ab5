//! Embedding client abstraction and implementations.
//!
//! Defines the [`Embedder`] trait and two implementations:
//! - **[`DisabledEmbedder`]** — returns errors; used when embeddings are not
//!   configured (dry runs, tests).
//! - **[`OpenAiEmbedder`]** — calls the OpenAI embeddings API with a pacing
//!   floor between requests, retry, and backoff.
//!
//! # Rate limiting
//!
//! Two mechanisms, deliberately separate:
//! - a [`Pacer`] enforces a minimum gap (default 350 ms) between consecutive
//!   request starts, success or failure, keeping the client under the
//!   provider's requests-per-second ceiling;
//! - exponential backoff (1s, 2s, 4s, ... capped at 2^5) retries HTTP 429
//!   and 5xx. Other 4xx responses fail immediately; network errors retry.
//!
//! Also provides vector byte-encoding for SQLite BLOB storage:
//! [`vec_to_blob`] / [`blob_to_vec`].

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::EmbeddingConfig;
use crate::error::{EmbedError, IngestError};

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Trait for embedding backends. The pipeline only sees this, which is also
/// the seam the tests mock.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
    /// Convert one passage text to a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

/// Enforces a minimum interval between consecutive calls to [`Pacer::wait`].
pub struct Pacer {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Pacer {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    /// Sleep until at least `min_interval` has passed since the previous
    /// `wait` returned, then record the new start time.
    pub async fn wait(&self) {
        let mut last = self.last_start.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// No-op embedder that always returns [`EmbedError::Disabled`].
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
        Err(EmbedError::Disabled)
    }
}

/// Embedding client for the OpenAI API (`POST /v1/embeddings`).
///
/// Requires `OPENAI_API_KEY` in the environment; validated at construction
/// so a missing credential is a pre-flight failure, not a mid-run one.
pub struct OpenAiEmbedder {
    model: String,
    dims: usize,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
    pacer: Pacer,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, IngestError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| IngestError::MissingCredential("OPENAI_API_KEY"))?;

        // load_config guarantees model and dims when the provider is enabled
        let model = config.model.clone().unwrap_or_default();
        let dims = config.dims.unwrap_or_default();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IngestError::Io(std::io::Error::other(e)))?;

        Ok(OpenAiEmbedder {
            model,
            dims,
            api_key,
            max_retries: config.max_retries,
            client,
            pacer: Pacer::new(Duration::from_millis(config.min_interval_ms)),
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EmbedError::Malformed(e.to_string()))?;
        parse_embedding_response(&json)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut last_err: Option<EmbedError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            // Pacing applies to every request start, retries included.
            self.pacer.wait().await;

            match self.request(text).await {
                Ok(vector) => return Ok(vector),
                Err(EmbedError::Api { status, body }) if status == 429 || status >= 500 => {
                    last_err = Some(EmbedError::Api { status, body });
                }
                Err(EmbedError::Network(e)) => {
                    last_err = Some(EmbedError::Network(e));
                }
                Err(e) => return Err(e),
            }
        }

        Err(EmbedError::RetriesExhausted(
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "embedding failed".to_string()),
        ))
    }
}

/// Extract `data[0].embedding` from the API response.
fn parse_embedding_response(json: &serde_json::Value) -> Result<Vec<f32>, EmbedError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| EmbedError::Malformed("missing data array".to_string()))?;

    let embedding = data
        .first()
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| EmbedError::Malformed("missing embedding".to_string()))?;

    let vector: Vec<f32> = embedding
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect();

    if vector.is_empty() {
        return Err(EmbedError::Malformed("empty embedding vector".to_string()));
    }

    Ok(vector)
}

/// Create the configured embedder. Credential checks happen here, before
/// any passage is processed.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, IngestError> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiEmbedder::new(config)?)),
        _ => Ok(Box::new(DisabledEmbedder)),
    }
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        let blob = vec_to_blob(&vec);
        assert_eq!(blob.len(), 20);
        assert_eq!(blob_to_vec(&blob), vec);
    }

    #[test]
    fn test_parse_response_ok() {
        let json = serde_json::json!({
            "data": [{"embedding": [0.1, 0.2, 0.3]}]
        });
        let vector = parse_embedding_response(&json).unwrap();
        assert_eq!(vector.len(), 3);
        assert!((vector[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_response_missing_data() {
        let json = serde_json::json!({"object": "list"});
        assert!(matches!(
            parse_embedding_response(&json),
            Err(EmbedError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_response_empty_vector() {
        let json = serde_json::json!({"data": [{"embedding": []}]});
        assert!(matches!(
            parse_embedding_response(&json),
            Err(EmbedError::Malformed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_enforces_minimum_gap() {
        let pacer = Pacer::new(Duration::from_millis(350));
        let start = Instant::now();
        for _ in 0..5 {
            pacer.wait().await;
        }
        // 5 calls, 4 enforced gaps of 350ms each.
        assert!(start.elapsed() >= Duration::from_millis(1400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_first_call_is_immediate() {
        let pacer = Pacer::new(Duration::from_millis(350));
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_disabled_embedder_errors() {
        let result = DisabledEmbedder.embed("anything").await;
        assert!(matches!(result, Err(EmbedError::Disabled)));
    }
}
