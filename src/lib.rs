//! Core pipeline for local LLM-based channel news annotation.
//!
//! Fetches posts from public Telegram channels, asks a local LLM (via
//! Ollama) for a structured annotation (title, tags, summary), attaches an
//! embedding vector, and returns one annotated record per post.
//!
//! Both model capabilities are traits with exactly two implementations: a
//! network-backed Ollama client and a deterministic stub for tests and
//! offline runs. Callers depend only on the traits.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod llm;
pub mod pipeline;
pub mod telegram;

pub use config::{ConfigError, ModelConfig, Settings};
pub use embedding::{EmbeddingBackend, EmbeddingError, OllamaEmbedder, StubEmbedder};
pub use llm::{AnnotationResult, Annotator, LlmBackend, LlmError, OllamaBackend, StubBackend};
pub use pipeline::{AnnotatedPost, AnnotationPipeline, PipelineError};
pub use telegram::{ChannelConfig, ChannelFetcher, FetchError, TelegramMessage};
