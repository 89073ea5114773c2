// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Serverless vector store persisted as JSON
//!
//! Each collection lives in `<persist_directory>/<collection>.json`. The HNSW
//! index is not persisted; it is rebuilt on the first query after a change.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::hnsw::HnswIndex;
use super::{Document, RetrievedDocument, VectorStore, VectorStoreError};
use crate::embeddings::Embedder;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    document: Document,
    embedding: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    model: String,
    dimension: usize,
    entries: Vec<StoredEntry>,
}

#[derive(Default)]
struct State {
    collection: CollectionFile,
    positions: HashMap<String, usize>,
    index: Option<HnswIndex>,
}

impl State {
    fn from_file(collection: CollectionFile) -> Self {
        let positions = collection
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.document.id.clone(), i))
            .collect();
        Self {
            collection,
            positions,
            index: None,
        }
    }

    fn ensure_index(&mut self) -> Result<&HnswIndex, VectorStoreError> {
        if self.index.is_none() {
            let vectors: Vec<&[f32]> = self
                .collection
                .entries
                .iter()
                .map(|e| e.embedding.as_slice())
                .collect();
            let index = HnswIndex::build(&vectors, self.collection.dimension)?;
            debug!("Rebuilt HNSW index over {} vectors", index.len());
            self.index = Some(index);
        }
        self.index
            .as_ref()
            .ok_or_else(|| VectorStoreError::Index("index unavailable".to_string()))
    }
}

pub struct LocalVectorStore {
    path: PathBuf,
    name: String,
    embedder: Arc<dyn Embedder>,
    state: RwLock<State>,
}

/// Path of a collection file under the persist directory
pub fn collection_path(persist_directory: &Path, collection: &str) -> PathBuf {
    persist_directory.join(format!("{}.json", collection))
}

impl LocalVectorStore {
    /// Open a collection, creating the directory as needed. With `reset`
    /// any existing collection file is removed.
    pub async fn open(
        persist_directory: &Path,
        collection: &str,
        embedder: Arc<dyn Embedder>,
        reset: bool,
    ) -> Result<Self, VectorStoreError> {
        if collection.is_empty() || collection.contains(['/', '\\']) {
            return Err(VectorStoreError::Persistence(format!(
                "invalid collection name: {:?}",
                collection
            )));
        }

        tokio::fs::create_dir_all(persist_directory)
            .await
            .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
        let path = collection_path(persist_directory, collection);

        if reset && path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
            info!("Deleted local collection {}", collection);
        }

        let state = if path.exists() {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
            let file: CollectionFile = serde_json::from_str(&content).map_err(|e| {
                VectorStoreError::Persistence(format!("{}: {}", path.display(), e))
            })?;
            info!(
                "Loaded local collection {} with {} documents",
                collection,
                file.entries.len()
            );
            State::from_file(file)
        } else {
            State::from_file(CollectionFile {
                name: collection.to_string(),
                model: embedder.model_name().to_string(),
                dimension: 0,
                entries: Vec::new(),
            })
        };

        Ok(Self {
            path,
            name: collection.to_string(),
            embedder,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, collection: &CollectionFile) -> Result<(), VectorStoreError> {
        let json = serde_json::to_vec(collection)
            .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
        // write then rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn add(&self, documents: &[Document]) -> Result<(), VectorStoreError> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let mut state = self.state.write().await;
        let expected = match state.collection.dimension {
            0 => embeddings.first().map(Vec::len).unwrap_or(0),
            dimension => dimension,
        };
        // reject the whole batch before touching the collection
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(VectorStoreError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }
        state.collection.dimension = expected;

        for (document, embedding) in documents.iter().zip(embeddings) {
            let entry = StoredEntry {
                document: document.clone(),
                embedding,
            };
            match state.positions.get(&document.id).copied() {
                Some(position) => state.collection.entries[position] = entry,
                None => {
                    let position = state.collection.entries.len();
                    state.collection.entries.push(entry);
                    state.positions.insert(document.id.clone(), position);
                }
            }
        }
        state.index = None;

        self.persist(&state.collection).await?;
        debug!("Stored {} documents in {}", documents.len(), self.name);
        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievedDocument>, VectorStoreError> {
        if n_results == 0 {
            return Ok(vec![]);
        }
        let embedding = self.embedder.embed(text).await?;

        let mut state = self.state.write().await;
        if state.collection.entries.is_empty() {
            return Ok(vec![]);
        }
        let neighbors = state.ensure_index()?.search(&embedding, n_results)?;

        Ok(neighbors
            .into_iter()
            .filter_map(|n| {
                state.collection.entries.get(n.position).map(|e| RetrievedDocument {
                    document: e.document.clone(),
                    distance: n.distance,
                })
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, VectorStoreError> {
        Ok(self.state.read().await.collection.entries.len())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
