//! LLM completion backends.
//!
//! `LlmBackend` is the capability the annotator depends on; there are
//! exactly two implementations: the Ollama HTTP client and a deterministic
//! stub for tests and offline runs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ModelConfig;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to connect to the LLM service
    #[error("Connection error: {0}")]
    Connection(String),
    /// API returned an error status
    #[error("API error: {0}")]
    Api(String),
    /// Failed to parse the response body
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Completion capability used by the annotator.
///
/// One request per call; errors propagate unchanged (no retry).
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, prompt: &str, config: &ModelConfig) -> Result<String, LlmError>;
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Minimal client for a local Ollama server.
///
/// Assumes the model is already pulled and loaded; temperature and token
/// options come from [`ModelConfig`] per call.
pub struct OllamaBackend {
    base_url: String,
    client: Client,
}

impl OllamaBackend {
    /// Create a backend pointing at the given Ollama base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 min timeout for slow models
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Check if the LLM service is available.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// List models available on the server.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(LlmError::Api(format!("HTTP {}", resp.status())));
        }

        #[derive(Deserialize)]
        struct TagsResponse {
            models: Vec<ModelInfo>,
        }

        #[derive(Deserialize)]
        struct ModelInfo {
            name: String,
        }

        let tags: TagsResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn complete(&self, prompt: &str, config: &ModelConfig) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: &config.llm_model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: config.temperature,
                num_predict: config.max_new_tokens,
            },
        };

        let url = format!("{}/api/generate", self.base_url);
        debug!("Requesting completion from {} ({})", url, config.llm_model);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(parsed.response.trim().to_string())
    }
}

/// A deterministic backend used in tests and offline runs.
pub struct StubBackend {
    canned_reply: String,
}

impl StubBackend {
    pub fn new(canned_reply: impl Into<String>) -> Self {
        Self {
            canned_reply: canned_reply.into(),
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new(
            "Title: Нейтральная заметка\n\
             Tags: тест, новости\n\
             Summary: Заглушка для оффлайн-режима.",
        )
    }
}

#[async_trait]
impl LlmBackend for StubBackend {
    async fn complete(&self, _prompt: &str, _config: &ModelConfig) -> Result<String, LlmError> {
        Ok(self.canned_reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_is_deterministic() {
        let backend = StubBackend::default();
        let config = ModelConfig::default();
        let first = backend.complete("prompt a", &config).await.unwrap();
        let second = backend.complete("prompt b", &config).await.unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("Title:"));
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let backend = OllamaBackend::new("http://localhost:11434/");
        assert_eq!(backend.base_url, "http://localhost:11434");
    }
}
