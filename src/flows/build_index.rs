// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embed subject documents from the knowledge graph into the vector store

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ChromaConfig, SparqlConfig};
use crate::embeddings::setup_embedder;
use crate::rdf::{build_documents, setup_kg_from_config, DocumentStrategy, DEFAULT_LANGUAGE};
use crate::utils::io::item_progress;
use crate::vector::{setup_vector_store, Document, VectorStore};

#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Drop the collection before indexing
    pub reset: bool,
    /// Only subjects present in this named graph
    pub graph: Option<String>,
    pub strategy: DocumentStrategy,
    pub lang: String,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            reset: false,
            graph: None,
            strategy: DocumentStrategy::default(),
            lang: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    pub documents: usize,
    pub batches: usize,
}

/// Upsert documents in chunks of `batch_size`
pub async fn index_documents(
    store: &dyn VectorStore,
    documents: &[Document],
    batch_size: usize,
) -> Result<IndexReport> {
    let batch_size = batch_size.max(1);
    info!("Indexing by batches of {} items", batch_size);

    let bar = item_progress(documents.len() as u64, "documents");
    let mut report = IndexReport {
        documents: 0,
        batches: 0,
    };
    for batch in documents.chunks(batch_size) {
        store
            .add(batch)
            .await
            .with_context(|| format!("Failed to index batch {}", report.batches + 1))?;
        report.documents += batch.len();
        report.batches += 1;
        bar.inc(batch.len() as u64);
    }
    bar.finish_and_clear();

    info!("Indexed {} items into {}", report.documents, store.name());
    Ok(report)
}

/// Build the subject index from the configured knowledge graph
pub async fn build_index(
    chroma: &ChromaConfig,
    sparql: &SparqlConfig,
    options: &IndexOptions,
) -> Result<IndexReport> {
    info!("Started building subject index");
    chroma.validate()?;
    sparql.validate()?;

    let embedder = setup_embedder(chroma)
        .await
        .context("Failed to load embedding model")?;
    let store = setup_vector_store(chroma, &chroma.collection_name, embedder, options.reset)
        .await
        .context("Failed to connect to vector store")?;
    let kg = setup_kg_from_config(sparql).context("Failed to open knowledge graph")?;

    let documents = build_documents(
        kg.as_ref(),
        options.strategy,
        options.graph.as_deref(),
        &options.lang,
    )
    .await
    .with_context(|| format!("Failed to build documents from {}", kg.location()))?;

    index_documents(store.as_ref(), &documents, chroma.batch_size).await
}
