// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use kg_llm_node::config::ChromaConfig;
use kg_llm_node::embeddings::{Embedder, EmbeddingError};
use kg_llm_node::vector::local_store::collection_path;
use kg_llm_node::vector::{setup_vector_store, Document, VectorStoreError};
use std::sync::Arc;

/// Counts a few words, enough to make nearest neighbours predictable
struct WordCountEmbedder;

#[async_trait]
impl Embedder for WordCountEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                ["electric", "water", "grass", "fire"]
                    .iter()
                    .map(|w| t.matches(w).count() as f32 + 0.01)
                    .collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "word-count"
    }
}

fn local_config(dir: &std::path::Path) -> ChromaConfig {
    ChromaConfig {
        host: "local".to_string(),
        persist_directory: dir.to_path_buf(),
        ..ChromaConfig::default()
    }
}

#[tokio::test]
async fn test_setup_local_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(dir.path());
    let store = setup_vector_store(&config, "pokemon", Arc::new(WordCountEmbedder), false)
        .await
        .unwrap();

    store
        .add(&[
            Document::new("a", "Pikachu electric"),
            Document::new("b", "Squirtle water"),
            Document::new("c", "Bulbasaur grass"),
        ])
        .await
        .unwrap();

    assert_eq!(store.name(), "pokemon");
    assert_eq!(store.count().await.unwrap(), 3);
    assert!(collection_path(dir.path(), "pokemon").exists());

    let results = store.query("grass type", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].document.id, "c");
    assert!(results[0].distance <= results[1].distance);
}

#[tokio::test]
async fn test_reset_drops_collection() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(dir.path());
    {
        let store = setup_vector_store(&config, "pokemon", Arc::new(WordCountEmbedder), false)
            .await
            .unwrap();
        store.add(&[Document::new("a", "electric")]).await.unwrap();
    }

    let reopened = setup_vector_store(&config, "pokemon", Arc::new(WordCountEmbedder), false)
        .await
        .unwrap();
    assert_eq!(reopened.count().await.unwrap(), 1);

    let reset = setup_vector_store(&config, "pokemon", Arc::new(WordCountEmbedder), true)
        .await
        .unwrap();
    assert_eq!(reset.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_collections_are_separate() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(dir.path());
    let kg = setup_vector_store(&config, "test", Arc::new(WordCountEmbedder), false)
        .await
        .unwrap();
    let examples = setup_vector_store(&config, "examples", Arc::new(WordCountEmbedder), false)
        .await
        .unwrap();

    kg.add(&[Document::new("a", "water")]).await.unwrap();
    assert_eq!(kg.count().await.unwrap(), 1);
    assert_eq!(examples.count().await.unwrap(), 0);
    assert!(examples.query("water", 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_collection_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(dir.path());
    let result = setup_vector_store(&config, "../escape", Arc::new(WordCountEmbedder), false).await;
    assert!(matches!(result, Err(VectorStoreError::Persistence(_))));
}
