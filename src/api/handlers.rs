// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

use super::ApiError;

/// Longest question accepted, in characters
pub const MAX_QUESTION_LENGTH: usize = 4096;

fn validate_question(question: &str) -> Result<(), ApiError> {
    if question.trim().is_empty() {
        return Err(ApiError::ValidationError {
            field: "question".to_string(),
            message: "question cannot be empty or contain only whitespace".to_string(),
        });
    }
    let length = question.chars().count();
    if length > MAX_QUESTION_LENGTH {
        return Err(ApiError::ValidationError {
            field: "question".to_string(),
            message: format!(
                "question cannot exceed {} characters (got {})",
                MAX_QUESTION_LENGTH, length
            ),
        });
    }
    Ok(())
}

/// Body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

impl AskRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_question(&self.question)
    }
}

/// Body of `POST /sparql`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparqlRequest {
    pub question: String,
    /// Run the generated query against the knowledge graph
    #[serde(default)]
    pub execute: bool,
}

impl SparqlRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_question(&self.question)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Answer,
    Sparql,
}

/// JSON frame sent over the chat socket. Plain-text frames are treated as
/// an `answer` question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub mode: ChatMode,
}

impl ChatRequest {
    pub fn from_frame(frame: &str) -> Self {
        serde_json::from_str(frame).unwrap_or_else(|_| ChatRequest {
            question: frame.to_string(),
            mode: ChatMode::Answer,
        })
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        validate_question(&self.question)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<usize>,
    pub examples_enabled: bool,
    pub kg_attached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
}
