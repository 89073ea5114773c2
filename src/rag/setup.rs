// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wire a [`RagPipeline`] from configuration

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use super::pipeline::RagPipeline;
use crate::config::{ChatConfig, ChromaConfig, SparqlConfig};
use crate::embeddings::{setup_embedder, Embedder};
use crate::llm::OpenAiChatClient;
use crate::rdf::setup_kg_from_config;
use crate::vector::{setup_vector_store, VectorStore};

async fn open_examples_store(
    chroma: &ChromaConfig,
    embedder: Arc<dyn Embedder>,
) -> Option<Arc<dyn VectorStore>> {
    let store = match setup_vector_store(chroma, &chroma.collection_examples, embedder, false).await
    {
        Ok(store) => store,
        Err(e) => {
            warn!("Examples collection unavailable: {}", e);
            return None;
        }
    };
    match store.count().await {
        Ok(0) => {
            warn!(
                "Examples collection {} is empty, SPARQL prompts will have no examples",
                chroma.collection_examples
            );
            None
        }
        Ok(count) => {
            info!("Using {} SPARQL examples", count);
            Some(store)
        }
        Err(e) => {
            warn!("Failed to count examples: {}", e);
            None
        }
    }
}

/// Build the pipeline. The examples collection and the knowledge graph are
/// optional: failures to reach them are logged and the pipeline runs
/// without them.
pub async fn setup_pipeline(
    chat: &ChatConfig,
    chroma: &ChromaConfig,
    sparql: Option<&SparqlConfig>,
) -> Result<RagPipeline> {
    chat.validate()?;
    chroma.validate()?;

    let embedder = setup_embedder(chroma)
        .await
        .context("Failed to load embedding model")?;
    let kg_store = setup_vector_store(chroma, &chroma.collection_name, embedder.clone(), false)
        .await
        .context("Failed to connect to vector store")?;
    let llm = OpenAiChatClient::from_config(chat).context("Invalid language model settings")?;
    info!("Using language model {} at {}", chat.model_id, chat.llm_api_url);

    let mut pipeline = RagPipeline::new(kg_store, Arc::new(llm), chat.clone());

    if let Some(store) = open_examples_store(chroma, embedder).await {
        pipeline = pipeline.with_examples_store(store);
    }

    if let Some(sparql) = sparql {
        match setup_kg_from_config(sparql) {
            Ok(kg) => pipeline = pipeline.with_triple_store(kg),
            Err(e) => warn!("Knowledge graph unavailable, queries will not be run: {}", e),
        }
    }

    Ok(pipeline)
}
