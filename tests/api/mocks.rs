// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Hand-written collaborators for the HTTP layer

use async_trait::async_trait;
use kg_llm_node::api::{ApiConfig, AppState};
use kg_llm_node::config::ChatConfig;
use kg_llm_node::llm::{Generation, LanguageModel, LlmError};
use kg_llm_node::rag::RagPipeline;
use kg_llm_node::vector::{Document, RetrievedDocument, VectorStore, VectorStoreError};
use std::sync::Arc;

pub struct FixedStore {
    pub documents: Vec<Document>,
}

#[async_trait]
impl VectorStore for FixedStore {
    async fn add(&self, _documents: &[Document]) -> Result<(), VectorStoreError> {
        Ok(())
    }

    async fn query(
        &self,
        _text: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievedDocument>, VectorStoreError> {
        Ok(self
            .documents
            .iter()
            .take(n_results)
            .map(|d| RetrievedDocument {
                document: d.clone(),
                distance: 0.1,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, VectorStoreError> {
        Ok(self.documents.len())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Vector store whose server is gone
pub struct DownStore;

#[async_trait]
impl VectorStore for DownStore {
    async fn add(&self, _documents: &[Document]) -> Result<(), VectorStoreError> {
        Err(VectorStoreError::Network("connection refused".to_string()))
    }

    async fn query(&self, _: &str, _: usize) -> Result<Vec<RetrievedDocument>, VectorStoreError> {
        Err(VectorStoreError::Network("connection refused".to_string()))
    }

    async fn count(&self) -> Result<usize, VectorStoreError> {
        Err(VectorStoreError::Network("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "down"
    }
}

pub struct CannedModel {
    pub reply: Result<String, ()>,
}

#[async_trait]
impl LanguageModel for CannedModel {
    async fn generate(&self, _prompt: &str) -> Result<Generation, LlmError> {
        match &self.reply {
            Ok(text) => Ok(Generation {
                text: text.clone(),
                tokens_used: 9,
            }),
            Err(()) => Err(LlmError::EmptyResponse),
        }
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

pub fn pokemon_docs() -> Vec<Document> {
    vec![Document::new("http://example.org/pokemon/Pikachu", "Pikachu\nAn electric mouse")
        .with_metadata("subject", "http://example.org/pokemon/Pikachu")
        .with_metadata(
            "triples",
            "<http://example.org/pokemon/Pikachu> <http://example.org/pokemon/type> <http://example.org/pokemon/Electric> .",
        )]
}

pub fn state_with(store: Arc<dyn VectorStore>, reply: Result<&str, ()>) -> AppState {
    let llm = Arc::new(CannedModel {
        reply: reply.map(str::to_string),
    });
    let pipeline = RagPipeline::new(store, llm, ChatConfig::default());
    AppState::new(Arc::new(pipeline), ApiConfig::default())
}

pub fn healthy_state(reply: &str) -> AppState {
    state_with(
        Arc::new(FixedStore {
            documents: pokemon_docs(),
        }),
        Ok(reply),
    )
}
