//! Prompting helper that turns raw posts into structured annotations.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::backend::{LlmBackend, LlmError};
use crate::config::ModelConfig;

/// Structured annotation parsed from an LLM completion.
///
/// Any field may be empty if the completion lacked a recognizable line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationResult {
    pub title: String,
    pub tags: Vec<String>,
    pub summary: String,
}

/// Builds a prompt for a raw post, sends it to the LLM backend, and parses
/// the free-text completion into an [`AnnotationResult`].
pub struct Annotator {
    backend: Arc<dyn LlmBackend>,
    config: ModelConfig,
}

impl Annotator {
    pub fn new(backend: Arc<dyn LlmBackend>, config: ModelConfig) -> Self {
        Self { backend, config }
    }

    /// Get the model config (for display in CLI).
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Build the instruction prompt for a post.
    ///
    /// The template requests exactly three labeled lines (Title, Tags,
    /// Summary); the parser's recognized labels must change in lockstep
    /// with it.
    pub fn build_prompt(&self, text: &str) -> String {
        format!(
            "Ты работаешь как помощник-редактор. Дан пост из Telegram. \n\
             1) Сформируй короткий заголовок (до 12 слов). \n\
             2) Подбери 3-6 тегов через запятую. \n\
             3) Дай краткий вывод (1-2 предложения). \n\
             Верни ответ в формате:\n\
             Title: ...\nTags: tag1, tag2\nSummary: ...\n\n\
             Текст: {}",
            text.trim()
        )
    }

    /// Annotate a single post.
    ///
    /// Fails only on backend transport errors; a malformed completion
    /// degrades to default-valued fields instead.
    pub async fn annotate(&self, text: &str) -> Result<AnnotationResult, LlmError> {
        let prompt = self.build_prompt(text);
        let completion = self.backend.complete(&prompt, &self.config).await?;
        debug!("Completion received ({} bytes)", completion.len());
        Ok(parse_completion(&completion))
    }
}

/// Parse a `Label: value` completion into structured fields.
///
/// Tolerant by design: LLM output is unreliable free text. Lines without a
/// colon are dropped, duplicate labels keep the last value, unrecognized
/// labels are ignored, and missing labels fall back to empty defaults.
fn parse_completion(completion: &str) -> AnnotationResult {
    let mut parsed: HashMap<String, String> = HashMap::new();
    for line in completion.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        parsed.insert(label.trim().to_lowercase(), value.trim().to_string());
    }

    AnnotationResult {
        title: parsed.get("title").cloned().unwrap_or_default(),
        tags: parsed.get("tags").map(|raw| split_tags(raw)).unwrap_or_default(),
        summary: parsed.get("summary").cloned().unwrap_or_default(),
    }
}

/// Split a tag list on commas and semicolons, dropping empty tokens.
fn split_tags(raw: &str) -> Vec<String> {
    raw.replace(',', ";")
        .split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
