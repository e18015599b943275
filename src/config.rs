//! Configuration for models and runtime connection settings.
//!
//! Split into two tiers:
//! - `ModelConfig`: what the models do (identifiers, generation params)
//! - `Settings`: how to reach them (endpoint, offline mode), from env vars
//!
//! Env vars: INFOCUS_ENDPOINT, INFOCUS_OFFLINE (OLLAMA_HOST accepted as
//! endpoint fallback)

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing configuration objects.
///
/// Construction is all-or-nothing: an invalid numeric parameter fails the
/// constructor and no partial object is produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_new_tokens must be positive")]
    InvalidMaxNewTokens,

    #[error("Channel message limit must be positive")]
    InvalidChannelLimit,
}

/// Configuration for LLM and embedding models.
///
/// Defaults are tuned for a single 16GB GPU with CPU fallbacks: the LLM is
/// small enough to run with 4-bit quantization, while the embedder targets
/// multilingual coverage. Immutable once constructed and shared by
/// reference across all backend calls in a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model alias for Ollama or a local runtime. Fits comfortably on a
    /// 16GB GPU.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Model alias for a local embedding service (nomic-embed) with GPU
    /// support.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Maximum tokens to generate per completion.
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    /// Temperature for generation (0.0 - 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_model() -> String {
    "qwen2.5:0.5b-instruct".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text:latest".to_string()
}

fn default_max_new_tokens() -> u32 {
    256
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            llm_model: default_llm_model(),
            embedding_model: default_embedding_model(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl ModelConfig {
    /// Create a validated config.
    pub fn new(
        llm_model: impl Into<String>,
        embedding_model: impl Into<String>,
        max_new_tokens: u32,
        temperature: f32,
    ) -> Result<Self, ConfigError> {
        if max_new_tokens == 0 {
            return Err(ConfigError::InvalidMaxNewTokens);
        }
        Ok(Self {
            llm_model: llm_model.into(),
            embedding_model: embedding_model.into(),
            max_new_tokens,
            temperature,
        })
    }

    /// Preset that targets a 4-bit Mistral 7B deployment.
    ///
    /// Returns a new independent instance; presets never mutate an
    /// existing config.
    pub fn for_mistral() -> Self {
        Self {
            llm_model: "mistral:instruct".to_string(),
            max_new_tokens: 256,
            temperature: 0.4,
            ..Self::default()
        }
    }
}

/// Runtime connection settings (from env vars, varies per device).
///
/// Endpoint precedence: INFOCUS_ENDPOINT, then OLLAMA_HOST, then the
/// local Ollama default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the Ollama-compatible model server.
    pub endpoint: String,
    /// Use deterministic stub backends instead of the model server.
    pub offline: bool,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            offline: false,
        }
    }
}

impl Settings {
    /// Create settings from environment variables.
    pub fn from_env() -> Self {
        let endpoint = std::env::var("INFOCUS_ENDPOINT")
            .or_else(|_| std::env::var("OLLAMA_HOST"))
            .unwrap_or_else(|_| default_endpoint());

        let offline = std::env::var("INFOCUS_OFFLINE")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Self { endpoint, offline }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert!(config.llm_model.contains("qwen"));
        assert!(config.embedding_model.contains("nomic"));
        assert_eq!(config.max_new_tokens, 256);
    }

    #[test]
    fn test_new_rejects_zero_tokens() {
        let result = ModelConfig::new("qwen2.5:0.5b-instruct", "nomic-embed-text:latest", 0, 0.3);
        assert!(matches!(result, Err(ConfigError::InvalidMaxNewTokens)));
    }

    #[test]
    fn test_mistral_preset_is_independent() {
        let default = ModelConfig::default();
        let mistral = ModelConfig::for_mistral();
        assert_eq!(mistral.llm_model, "mistral:instruct");
        assert_eq!(mistral.temperature, 0.4);
        // Preset shares the embedder but never touches the default instance
        assert_eq!(mistral.embedding_model, default.embedding_model);
        assert!(default.llm_model.contains("qwen"));
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
    }

    #[test]
    fn test_settings_env_precedence() {
        // Single test owns these vars; other tests must not touch them.
        std::env::remove_var("INFOCUS_ENDPOINT");
        std::env::remove_var("OLLAMA_HOST");
        std::env::remove_var("INFOCUS_OFFLINE");
        assert_eq!(Settings::from_env(), Settings::default());

        std::env::set_var("OLLAMA_HOST", "http://gpu-box:11434");
        assert_eq!(Settings::from_env().endpoint, "http://gpu-box:11434");

        std::env::set_var("INFOCUS_ENDPOINT", "http://annotator:8080");
        assert_eq!(Settings::from_env().endpoint, "http://annotator:8080");

        std::env::set_var("INFOCUS_OFFLINE", "true");
        assert!(Settings::from_env().offline);

        std::env::remove_var("INFOCUS_ENDPOINT");
        std::env::remove_var("OLLAMA_HOST");
        std::env::remove_var("INFOCUS_OFFLINE");
    }
}
