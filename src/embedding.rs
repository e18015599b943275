//! Embedding backends.
//!
//! `EmbeddingBackend` mirrors the completion capability: an Ollama HTTP
//! client and a deterministic stub. The real variant sends the whole text
//! batch in a single request.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ModelConfig;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Failed to connect to the embedding service
    #[error("Connection error: {0}")]
    Connection(String),
    /// API returned an error status
    #[error("API error: {0}")]
    Api(String),
    /// Failed to parse the response body
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Batch embedding capability: one vector per input text, same order.
///
/// The vector dimension is the backend's contract; the core attaches
/// whatever comes back.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(
        &self,
        texts: &[String],
        config: &ModelConfig,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// A degenerate server response without an `embeddings` field decodes to
/// an empty batch; the pipeline pads the missing vectors.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

/// Client for a local embedding service compatible with `nomic-embed`.
///
/// The service handles batching internally; for small payloads the full
/// text list goes out in a single request.
pub struct OllamaEmbedder {
    base_url: String,
    client: Client,
}

impl OllamaEmbedder {
    /// Create an embedder pointing at the given Ollama base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        config: &ModelConfig,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbedRequest {
            model: &config.embedding_model,
            input: texts,
        };

        let url = format!("{}/api/embed", self.base_url);
        debug!("Embedding {} texts via {}", texts.len(), url);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("HTTP {}: {}", status, body)));
        }

        let parsed: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(e.to_string()))?;

        Ok(parsed.embeddings)
    }
}

/// Deterministic embedder for tests and offline mode.
///
/// Returns a single-element vector per text holding its character count: a
/// cheap placeholder that satisfies the shape contract without real
/// semantics.
pub struct StubEmbedder;

#[async_trait]
impl EmbeddingBackend for StubEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        _config: &ModelConfig,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| vec![text.chars().count() as f32])
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_embeds_char_counts() {
        let config = ModelConfig::default();
        let texts = vec!["abc".to_string(), "тест".to_string()];
        let vectors = StubEmbedder.embed(&texts, &config).await.unwrap();
        // Code points, not bytes: "тест" is 4 chars / 8 bytes
        assert_eq!(vectors, vec![vec![3.0], vec![4.0]]);
    }

    #[tokio::test]
    async fn test_stub_empty_batch() {
        let config = ModelConfig::default();
        let vectors = StubEmbedder.embed(&[], &config).await.unwrap();
        assert!(vectors.is_empty());
    }
}
