// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sentence embeddings
//!
//! Documents and questions are embedded client-side before they reach the
//! vector store. Two backends are available: a local ONNX sentence
//! transformer and a remote OpenAI-compatible embeddings API.

pub mod onnx_model;
pub mod remote;

pub use onnx_model::OnnxEmbedder;
pub use remote::RemoteEmbedder;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::ChromaConfig;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load embedding model: {0}")]
    ModelLoad(String),

    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Embedding API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<ort::Error> for EmbeddingError {
    fn from(err: ort::Error) -> Self {
        EmbeddingError::Inference(err.to_string())
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        EmbeddingError::Network(err.to_string())
    }
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed several texts, one vector per input in the same order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".to_string()))
    }

    /// Output dimension, 0 when not yet known
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// L2-normalize a vector in place. Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Pick the embedding backend: the remote API when `embedding_url` is set,
/// otherwise the ONNX model under the configured model directory.
pub async fn setup_embedder(config: &ChromaConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    if let Some(url) = &config.embedding_url {
        info!("Using remote embeddings at {} ({})", url, config.embedding_model);
        let embedder = RemoteEmbedder::new(
            url,
            &config.embedding_model,
            config.embedding_api_key.clone(),
        )?;
        return Ok(Arc::new(embedder));
    }

    let dir = config.model_dir();
    info!("Loading ONNX embedding model from {}", dir.display());
    let embedder = OnnxEmbedder::from_dir(&config.embedding_model, &dir).await?;
    Ok(Arc::new(embedder))
}
