// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Index question/query examples used to prompt for SPARQL

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use super::build_index::{index_documents, IndexReport};
use crate::config::ChromaConfig;
use crate::embeddings::setup_embedder;
use crate::rag::load_sparql_examples;
use crate::vector::setup_vector_store;

pub async fn build_examples_index(
    chroma: &ChromaConfig,
    examples_dir: &Path,
    reset: bool,
) -> Result<IndexReport> {
    chroma.validate()?;
    let examples = load_sparql_examples(examples_dir)
        .with_context(|| format!("Failed to load examples from {}", examples_dir.display()))?;
    if examples.is_empty() {
        warn!("No SPARQL examples found in {}", examples_dir.display());
    } else {
        info!("Loaded {} SPARQL examples", examples.len());
    }

    let embedder = setup_embedder(chroma)
        .await
        .context("Failed to load embedding model")?;
    let store = setup_vector_store(chroma, &chroma.collection_examples, embedder, reset)
        .await
        .context("Failed to connect to vector store")?;

    index_documents(store.as_ref(), &examples, chroma.batch_size).await
}
