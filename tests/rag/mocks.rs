// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Hand-written stand-ins for the embedding model and the language model

use async_trait::async_trait;
use kg_llm_node::embeddings::{Embedder, EmbeddingError};
use kg_llm_node::llm::{Generation, LanguageModel, LlmError};
use std::sync::Mutex;

const WORDS: [&str; 5] = ["electric", "water", "evolve", "grass", "fire"];

/// Bag of a few words, so nearest neighbours are predictable
pub struct WordCountEmbedder;

#[async_trait]
impl Embedder for WordCountEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                WORDS
                    .iter()
                    .map(|w| t.matches(w).count() as f32 + 0.01)
                    .collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        WORDS.len()
    }

    fn model_name(&self) -> &str {
        "word-count"
    }
}

/// Replies with a fixed text and keeps every prompt it was sent
pub struct ScriptedModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<Generation, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(Generation {
            text: self.reply.clone(),
            tokens_used: 12,
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
