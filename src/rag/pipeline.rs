// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieve-then-generate
//!
//! A question is embedded and matched against the subject documents. The
//! triples attached to the nearest documents become the prompt context,
//! and the language model either answers in prose or writes a SPARQL query.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::errors::RagError;
use super::examples::format_examples;
use super::postprocess::{extract_sparql, post_process_answer};
use super::prompt::PromptTemplate;
use crate::config::ChatConfig;
use crate::llm::LanguageModel;
use crate::rdf::{QueryRows, TripleStore, SUBJECT_KEY, TRIPLES_KEY};
use crate::utils::context::{estimate_tokens, truncate_to_tokens};
use crate::vector::{RetrievedDocument, VectorStore};

/// A document used to ground an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub distance: f32,
}

impl From<&RetrievedDocument> for Source {
    fn from(doc: &RetrievedDocument) -> Self {
        Self {
            id: doc.document.id.clone(),
            subject: doc.document.metadata_value(SUBJECT_KEY).map(str::to_string),
            distance: doc.distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedContext {
    /// Context text, already cut to the prompt budget
    pub text: String,
    pub documents: Vec<RetrievedDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<Source>,
    pub tokens_used: u32,
    /// Context the answer was generated from
    #[serde(skip)]
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparqlAnswer {
    pub question: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<QueryRows>,
    pub sources: Vec<Source>,
    pub tokens_used: u32,
    #[serde(skip)]
    pub context: String,
}

pub struct RagPipeline {
    kg_store: Arc<dyn VectorStore>,
    examples_store: Option<Arc<dyn VectorStore>>,
    llm: Arc<dyn LanguageModel>,
    triple_store: Option<Arc<dyn TripleStore>>,
    config: ChatConfig,
    answer_template: PromptTemplate,
    sparql_template: PromptTemplate,
}

fn check_question(question: &str) -> Result<&str, RagError> {
    let question = question.trim();
    if question.is_empty() {
        Err(RagError::EmptyQuestion)
    } else {
        Ok(question)
    }
}

impl RagPipeline {
    pub fn new(
        kg_store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
        config: ChatConfig,
    ) -> Self {
        let answer_template = PromptTemplate::new(&config.answer_template);
        let sparql_template = PromptTemplate::new(&config.sparql_template);
        Self {
            kg_store,
            examples_store: None,
            llm,
            triple_store: None,
            config,
            answer_template,
            sparql_template,
        }
    }

    pub fn with_examples_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.examples_store = Some(store);
        self
    }

    pub fn with_triple_store(mut self, store: Arc<dyn TripleStore>) -> Self {
        self.triple_store = Some(store);
        self
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn kg_store(&self) -> &Arc<dyn VectorStore> {
        &self.kg_store
    }

    pub fn llm(&self) -> &Arc<dyn LanguageModel> {
        &self.llm
    }

    pub fn has_examples(&self) -> bool {
        self.examples_store.is_some()
    }

    pub fn has_triple_store(&self) -> bool {
        self.triple_store.is_some()
    }

    /// Tokens left for context once the template, question and generated
    /// tokens are accounted for
    fn context_budget(&self, template: &str, question: &str, extra: &str) -> usize {
        self.config
            .max_input_size
            .saturating_sub(self.config.max_new_tokens as usize)
            .saturating_sub(estimate_tokens(template))
            .saturating_sub(estimate_tokens(question))
            .saturating_sub(estimate_tokens(extra))
    }

    async fn retrieve_within(
        &self,
        question: &str,
        budget: usize,
    ) -> Result<RetrievedContext, RagError> {
        let documents = self
            .kg_store
            .query(question, self.config.num_context_docs)
            .await?;
        debug!("Retrieved {} context documents", documents.len());

        let joined = documents
            .iter()
            .map(|doc| {
                doc.document
                    .metadata_value(TRIPLES_KEY)
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or(&doc.document.text)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let text = truncate_to_tokens(&joined, budget);
        if text.len() < joined.len() {
            warn!(
                "Context truncated from ~{} to ~{} tokens",
                estimate_tokens(&joined),
                estimate_tokens(text)
            );
        }

        Ok(RetrievedContext {
            text: text.to_string(),
            documents,
        })
    }

    /// Nearest subject documents for the question, joined into prompt context
    pub async fn retrieve_context(&self, question: &str) -> Result<RetrievedContext, RagError> {
        let question = check_question(question)?;
        let budget = self.context_budget(&self.config.answer_template, question, "");
        self.retrieve_within(question, budget).await
    }

    /// Answer a question in prose from the retrieved context
    pub async fn answer(&self, question: &str) -> Result<Answer, RagError> {
        let question = check_question(question)?;
        let start = Instant::now();

        let budget = self.context_budget(&self.config.answer_template, question, "");
        let context = self.retrieve_within(question, budget).await?;
        let prompt = self.answer_template.format(&[
            ("context_str", context.text.as_str()),
            ("question_str", question),
        ])?;

        let generation = self.llm.generate(&prompt).await?;
        let answer = post_process_answer(&generation.text);

        info!(
            "Answered question in {}ms ({} sources, {} tokens)",
            start.elapsed().as_millis(),
            context.documents.len(),
            generation.tokens_used
        );

        Ok(Answer {
            question: question.to_string(),
            answer,
            sources: context.documents.iter().map(Source::from).collect(),
            tokens_used: generation.tokens_used,
            context: context.text,
        })
    }

    /// Example blocks for the SPARQL prompt, empty without an examples store
    async fn retrieve_examples(&self, question: &str) -> Result<String, RagError> {
        let Some(store) = &self.examples_store else {
            return Ok(String::new());
        };
        if self.config.num_examples == 0 {
            return Ok(String::new());
        }

        let examples = store.query(question, self.config.num_examples).await?;
        let documents: Vec<_> = examples.into_iter().map(|e| e.document).collect();
        debug!("Retrieved {} query examples", documents.len());
        Ok(format_examples(&documents))
    }

    /// Write a SPARQL query for the question. With `execute` and an attached
    /// triple store the query is also run.
    pub async fn generate_sparql(
        &self,
        question: &str,
        execute: bool,
    ) -> Result<SparqlAnswer, RagError> {
        let question = check_question(question)?;
        let start = Instant::now();

        let examples = self.retrieve_examples(question).await?;
        let budget = self.context_budget(&self.config.sparql_template, question, &examples);
        let context = self.retrieve_within(question, budget).await?;

        let prompt = self.sparql_template.format(&[
            ("examples_str", examples.as_str()),
            ("context_str", context.text.as_str()),
            ("question_str", question),
        ])?;

        let generation = self.llm.generate(&prompt).await?;
        let query = extract_sparql(&generation.text).ok_or(RagError::NoQueryGenerated)?;

        let results = match (&self.triple_store, execute) {
            (Some(kg), true) => {
                let rows = kg.select(&query).await?;
                debug!("Generated query returned {} rows", rows.len());
                Some(rows)
            }
            (None, true) => {
                warn!("Query execution requested but no knowledge graph is attached");
                None
            }
            _ => None,
        };

        info!(
            "Generated SPARQL in {}ms ({} tokens)",
            start.elapsed().as_millis(),
            generation.tokens_used
        );

        Ok(SparqlAnswer {
            question: question.to_string(),
            query,
            results,
            sources: context.documents.iter().map(Source::from).collect(),
            tokens_used: generation.tokens_used,
            context: context.text,
        })
    }
}
