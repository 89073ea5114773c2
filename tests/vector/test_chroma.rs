// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use kg_llm_node::config::ChromaConfig;
use kg_llm_node::embeddings::{Embedder, EmbeddingError};
use kg_llm_node::vector::{setup_vector_store, ChromaStore, Document, VectorStoreError};
use std::sync::Arc;

struct ConstantEmbedder;

#[async_trait]
impl Embedder for ConstantEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| vec![t.len() as f32, 1.0, 0.5])
            .collect())
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "constant"
    }
}

#[tokio::test]
async fn test_unreachable_chroma() {
    let result = ChromaStore::connect(
        "http://127.0.0.1:59999",
        "test",
        Arc::new(ConstantEmbedder),
        false,
    )
    .await;
    assert!(matches!(result, Err(VectorStoreError::Network(_))));
}

#[tokio::test]
async fn test_setup_uses_remote_for_hosts() {
    let config = ChromaConfig {
        host: "127.0.0.1".to_string(),
        port: 59999,
        ..ChromaConfig::default()
    };
    let result = setup_vector_store(&config, "test", Arc::new(ConstantEmbedder), false).await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore] // Requires a running Chroma server at CHROMA_HOST:CHROMA_PORT
async fn test_live_chroma_roundtrip() {
    let config = ChromaConfig::from_env();
    let store = setup_vector_store(&config, "kg-llm-node-test", Arc::new(ConstantEmbedder), true)
        .await
        .unwrap();
    store
        .add(&[
            Document::new("a", "short").with_metadata("subject", "http://ex.org/a"),
            Document::new("b", "a much longer text"),
        ])
        .await
        .unwrap();
    assert_eq!(store.count().await.unwrap(), 2);

    let results = store.query("short", 1).await.unwrap();
    assert_eq!(results[0].document.id, "a");
    assert_eq!(results[0].document.metadata_value("subject"), Some("http://ex.org/a"));
}
