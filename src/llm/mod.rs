//! LLM integration for post annotation.
//!
//! Uses a local LLM (via Ollama) to generate titles, tags, and summaries
//! for channel posts.

mod annotator;
mod backend;

pub use annotator::{AnnotationResult, Annotator};
pub use backend::{LlmBackend, LlmError, OllamaBackend, StubBackend};
