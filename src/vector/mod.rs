// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vector stores for subject documents and query examples
//!
//! A collection is either hosted by a Chroma server or kept on disk by the
//! local store (`host = "local"`). Both embed texts client-side with the
//! configured [`Embedder`].

pub mod chroma;
pub mod hnsw;
pub mod local_store;

pub use chroma::ChromaStore;
pub use hnsw::HnswIndex;
pub use local_store::LocalVectorStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::ChromaConfig;
use crate::embeddings::{Embedder, EmbeddingError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// A document returned by a similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    #[serde(flatten)]
    pub document: Document,
    /// Distance to the query, smaller is closer
    pub distance: f32,
}

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store unreachable: {0}")]
    Network(String),

    #[error("Vector store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Invalid vector store response: {0}")]
    InvalidResponse(String),

    #[error("Failed to persist collection: {0}")]
    Persistence(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<reqwest::Error> for VectorStoreError {
    fn from(err: reqwest::Error) -> Self {
        VectorStoreError::Network(err.to_string())
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace documents by id
    async fn add(&self, documents: &[Document]) -> Result<(), VectorStoreError>;

    /// The `n_results` documents nearest to the text, nearest first
    async fn query(
        &self,
        text: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievedDocument>, VectorStoreError>;

    async fn count(&self) -> Result<usize, VectorStoreError>;

    /// Collection name
    fn name(&self) -> &str;
}

/// Connect to a collection, creating it when missing. With `reset` the
/// collection is deleted first.
pub async fn setup_vector_store(
    config: &ChromaConfig,
    collection: &str,
    embedder: Arc<dyn Embedder>,
    reset: bool,
) -> Result<Arc<dyn VectorStore>, VectorStoreError> {
    if config.is_local() {
        info!(
            "Using local vector store at {} (collection {})",
            config.persist_directory.display(),
            collection
        );
        let store =
            LocalVectorStore::open(&config.persist_directory, collection, embedder, reset).await?;
        Ok(Arc::new(store))
    } else {
        let base_url = config.base_url();
        info!("Using Chroma at {} (collection {})", base_url, collection);
        let store = ChromaStore::connect(&base_url, collection, embedder, reset).await?;
        Ok(Arc::new(store))
    }
}
