// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for retrieval-augmented generation
//!
//! Wraps the failures of each collaborator (vector store, language model,
//! knowledge graph) so callers can tell a bad question from an unavailable
//! backend.

use thiserror::Error;

use crate::llm::LlmError;
use crate::rdf::KgError;
use crate::vector::VectorStoreError;

#[derive(Error, Debug)]
pub enum RagError {
    /// Question was empty or whitespace
    #[error("Question cannot be empty")]
    EmptyQuestion,

    /// A template variable had no value
    #[error("Missing value for prompt variable: {0}")]
    MissingVariable(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] VectorStoreError),

    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Query execution failed: {0}")]
    QueryExecution(#[from] KgError),

    /// The model output held no SPARQL query
    #[error("No SPARQL query found in model output")]
    NoQueryGenerated,

    #[error("Failed to read examples: {0}")]
    Examples(String),
}

impl RagError {
    /// Get user-friendly error message for API responses
    pub fn user_message(&self) -> String {
        match self {
            RagError::Retrieval(_) => "The document index is unavailable".to_string(),
            RagError::Generation(LlmError::RateLimited) => {
                "The language model is busy, try again shortly".to_string()
            }
            RagError::Generation(_) => "The language model is unavailable".to_string(),
            RagError::QueryExecution(e) => format!("The generated query failed: {}", e),
            _ => self.to_string(),
        }
    }

    /// Get error code for logging and metrics
    pub fn error_code(&self) -> &'static str {
        match self {
            RagError::EmptyQuestion => "EMPTY_QUESTION",
            RagError::MissingVariable(_) => "MISSING_VARIABLE",
            RagError::Retrieval(_) => "RETRIEVAL_FAILED",
            RagError::Generation(_) => "GENERATION_FAILED",
            RagError::QueryExecution(_) => "QUERY_EXECUTION_FAILED",
            RagError::NoQueryGenerated => "NO_QUERY_GENERATED",
            RagError::Examples(_) => "EXAMPLES_ERROR",
        }
    }

    /// Whether the caller sent something invalid, as opposed to a backend failing
    pub fn is_client_error(&self) -> bool {
        matches!(self, RagError::EmptyQuestion)
    }
}
