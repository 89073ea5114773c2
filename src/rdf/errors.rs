// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Knowledge graph errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KgError {
    #[error("Invalid SPARQL endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to read RDF file {path}: {message}")]
    RdfFile { path: PathBuf, message: String },

    #[error("Unknown RDF format for file {0}")]
    UnknownFormat(PathBuf),

    #[error("Authentication rejected by SPARQL endpoint")]
    Unauthorized,

    #[error("SPARQL endpoint returned {status}: {message}")]
    Endpoint { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse SPARQL results: {0}")]
    InvalidResults(String),

    #[error("Query evaluation failed: {0}")]
    Query(String),

    #[error("Update failed: {0}")]
    Update(String),

    #[error("Invalid language tag: {0}")]
    InvalidLanguage(String),

    #[error("Unexpected result form: expected {0}")]
    UnexpectedResultForm(&'static str),
}

impl From<reqwest::Error> for KgError {
    fn from(err: reqwest::Error) -> Self {
        KgError::Network(err.to_string())
    }
}

impl KgError {
    /// True when retrying later might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            KgError::Network(_) => true,
            KgError::Endpoint { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
