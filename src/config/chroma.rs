// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vector store and embedding configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{env_opt, env_or, env_parse_or, ConfigError};

/// Host value that selects the serverless, on-disk vector store.
pub const LOCAL_HOST: &str = "local";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default = "ChromaConfig::from_env")]
pub struct ChromaConfig {
    /// Chroma server host, or "local" for the persisted local store
    pub host: String,
    pub port: u16,
    /// Collection holding subject documents
    pub collection_name: String,
    /// Collection holding question/query examples
    pub collection_examples: String,
    /// Documents embedded and stored per request
    pub batch_size: usize,
    /// Name of the sentence embedding model
    pub embedding_model: String,
    /// OpenAI-compatible embeddings API; when unset the ONNX model is used
    pub embedding_url: Option<String>,
    pub embedding_api_key: Option<String>,
    /// Directory containing model.onnx and tokenizer.json
    pub embedding_model_dir: Option<PathBuf>,
    /// Where the local store keeps its collections
    pub persist_directory: PathBuf,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            collection_name: "test".to_string(),
            collection_examples: "examples".to_string(),
            batch_size: 50,
            embedding_model: "all-mpnet-base-v2".to_string(),
            embedding_url: None,
            embedding_api_key: None,
            embedding_model_dir: None,
            persist_directory: PathBuf::from(".chroma/"),
        }
    }
}

impl ChromaConfig {
    /// Defaults overlaid with CHROMA_* and EMBEDDING_* environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("CHROMA_HOST", &defaults.host),
            port: env_parse_or("CHROMA_PORT", defaults.port),
            collection_name: env_or("CHROMA_COLLECTION", &defaults.collection_name),
            collection_examples: env_or(
                "CHROMA_EXAMPLES_COLLECTION",
                &defaults.collection_examples,
            ),
            batch_size: env_parse_or("CHROMA_BATCH_SIZE", defaults.batch_size),
            embedding_model: env_or("CHROMA_MODEL", &defaults.embedding_model),
            embedding_url: env_opt("EMBEDDING_URL"),
            embedding_api_key: env_opt("EMBEDDING_API_KEY"),
            embedding_model_dir: env_opt("EMBEDDING_MODEL_DIR").map(PathBuf::from),
            persist_directory: env_opt("CHROMA_PERSIST_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.persist_directory),
        }
    }

    pub fn is_local(&self) -> bool {
        self.host == LOCAL_HOST
    }

    /// Base URL of the Chroma server
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }

    /// ONNX model directory, defaulting to ./models/<embedding_model>-onnx
    pub fn model_dir(&self) -> PathBuf {
        self.embedding_model_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("./models/{}-onnx", self.embedding_model)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "batch_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if !self.is_local() && self.port == 0 {
            return Err(ConfigError::Invalid {
                field: "port".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.collection_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "collection_name".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
