//! End-to-end annotation pipeline combining LLM and embedding backends.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::embedding::{EmbeddingBackend, EmbeddingError};
use crate::llm::{Annotator, LlmError};

/// Errors that abort a pipeline run.
///
/// Either backend failing for any post fails the whole batch; no partial
/// result set is returned.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// A post with its annotation and embedding attached.
///
/// Constructed once per input post, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedPost {
    pub text: String,
    pub title: String,
    pub tags: Vec<String>,
    pub summary: String,
    pub embedding: Vec<f32>,
}

/// Per-post orchestration of annotator and embedder.
///
/// Posts are processed strictly sequentially; output order matches input
/// order exactly.
pub struct AnnotationPipeline {
    annotator: Annotator,
    embedder: Arc<dyn EmbeddingBackend>,
    config: ModelConfig,
}

impl AnnotationPipeline {
    pub fn new(
        annotator: Annotator,
        embedder: Arc<dyn EmbeddingBackend>,
        config: ModelConfig,
    ) -> Self {
        Self {
            annotator,
            embedder,
            config,
        }
    }

    /// Annotate a batch of posts: one [`AnnotatedPost`] per input, in
    /// input order.
    pub async fn annotate_posts(
        &self,
        posts: &[String],
    ) -> Result<Vec<AnnotatedPost>, PipelineError> {
        info!("Annotating {} posts", posts.len());
        let mut annotated = Vec::with_capacity(posts.len());
        for post in posts {
            let result = self.annotator.annotate(post).await?;
            let embeddings = self
                .embedder
                .embed(std::slice::from_ref(post), &self.config)
                .await?;
            // A short embedding batch still yields a slot for the post
            let vector = embeddings.into_iter().next().unwrap_or_default();
            debug!(
                "Annotated post ({} chars, {} tags, dim {})",
                post.chars().count(),
                result.tags.len(),
                vector.len()
            );
            annotated.push(AnnotatedPost {
                text: post.clone(),
                title: result.title,
                tags: result.tags,
                summary: result.summary,
                embedding: vector,
            });
        }
        Ok(annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::embedding::StubEmbedder;
    use crate::llm::{LlmBackend, StubBackend};

    fn stub_pipeline(reply: &str) -> AnnotationPipeline {
        let config = ModelConfig::default();
        let annotator = Annotator::new(Arc::new(StubBackend::new(reply)), config.clone());
        AnnotationPipeline::new(annotator, Arc::new(StubEmbedder), config)
    }

    #[tokio::test]
    async fn test_one_output_per_input_in_order() {
        let pipeline = stub_pipeline("Title: X\nTags: a, b\nSummary: Y");
        let posts: Vec<String> = vec!["first", "second post", "third"]
            .into_iter()
            .map(String::from)
            .collect();

        let results = pipeline.annotate_posts(&posts).await.unwrap();

        assert_eq!(results.len(), posts.len());
        for (post, item) in posts.iter().zip(&results) {
            assert_eq!(&item.text, post);
            assert_eq!(item.title, "X");
            assert_eq!(item.tags, vec!["a", "b"]);
            assert_eq!(item.summary, "Y");
            assert_eq!(item.embedding, vec![post.chars().count() as f32]);
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pipeline = stub_pipeline("Title: X");
        let results = pipeline.annotate_posts(&[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_degenerate_completion_yields_default_fields() {
        let pipeline = stub_pipeline("no labels in here");
        let posts = vec!["abc".to_string()];
        let results = pipeline.annotate_posts(&posts).await.unwrap();
        assert_eq!(results[0].title, "");
        assert!(results[0].tags.is_empty());
        assert_eq!(results[0].summary, "");
        // Embedding still attached
        assert_eq!(results[0].embedding, vec![3.0]);
    }

    /// Embedder that returns fewer vectors than requested.
    struct ShortBatchEmbedder;

    #[async_trait]
    impl EmbeddingBackend for ShortBatchEmbedder {
        async fn embed(
            &self,
            _texts: &[String],
            _config: &ModelConfig,
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_short_embedding_batch_falls_back_to_empty_vector() {
        let config = ModelConfig::default();
        let annotator = Annotator::new(Arc::new(StubBackend::default()), config.clone());
        let pipeline = AnnotationPipeline::new(annotator, Arc::new(ShortBatchEmbedder), config);

        let posts = vec!["пост".to_string()];
        let results = pipeline.annotate_posts(&posts).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].embedding.is_empty());
        assert!(results[0].title.starts_with("Нейтральная"));
    }

    /// Backend that fails on the nth call.
    struct FailingBackend {
        calls: AtomicUsize,
        fail_at: usize,
    }

    #[async_trait]
    impl LlmBackend for FailingBackend {
        async fn complete(
            &self,
            _prompt: &str,
            _config: &ModelConfig,
        ) -> Result<String, LlmError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.fail_at {
                return Err(LlmError::Connection("connection refused".to_string()));
            }
            Ok("Title: ok".to_string())
        }
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_whole_batch() {
        let config = ModelConfig::default();
        let backend = Arc::new(FailingBackend {
            calls: AtomicUsize::new(0),
            fail_at: 1,
        });
        let annotator = Annotator::new(backend.clone(), config.clone());
        let pipeline = AnnotationPipeline::new(annotator, Arc::new(StubEmbedder), config);

        let posts: Vec<String> = vec!["a", "b", "c"].into_iter().map(String::from).collect();
        let err = pipeline.annotate_posts(&posts).await.unwrap_err();
        assert!(matches!(err, PipelineError::Llm(LlmError::Connection(_))));
        // Remaining posts were never attempted
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }
}
