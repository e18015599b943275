//! End-to-end pipeline run against the deterministic stub backends.

use std::sync::Arc;

use infocus::{AnnotationPipeline, Annotator, ModelConfig, StubBackend, StubEmbedder};

#[tokio::test]
async fn annotation_pipeline_stubbed() {
    let config = ModelConfig::default();
    let annotator = Annotator::new(Arc::new(StubBackend::default()), config.clone());
    let pipeline = AnnotationPipeline::new(annotator, Arc::new(StubEmbedder), config);

    let posts = vec!["Короткая новость про запуск сервиса.".to_string()];

    let results = pipeline.annotate_posts(&posts).await.unwrap();
    assert_eq!(results.len(), 1);

    let item = &results[0];
    assert_eq!(item.text, posts[0]);
    assert!(item.title.starts_with("Нейтральная"));
    assert_eq!(item.tags, vec!["тест", "новости"]);
    assert_eq!(item.summary, "Заглушка для оффлайн-режима.");
    assert_eq!(item.embedding, vec![posts[0].chars().count() as f32]);
}

#[tokio::test]
async fn annotation_pipeline_preserves_batch_order() {
    let config = ModelConfig::default();
    let annotator = Annotator::new(Arc::new(StubBackend::default()), config.clone());
    let pipeline = AnnotationPipeline::new(annotator, Arc::new(StubEmbedder), config);

    let posts: Vec<String> = (1..=5).map(|i| format!("пост номер {}", i)).collect();

    let results = pipeline.annotate_posts(&posts).await.unwrap();
    assert_eq!(results.len(), posts.len());
    for (post, item) in posts.iter().zip(&results) {
        assert_eq!(&item.text, post);
        assert_eq!(item.embedding, vec![post.chars().count() as f32]);
    }
}
