// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the knowledge-graph chatbot
//!
//! Each component has its own config struct with environment-derived
//! defaults. Config files may be YAML, TOML or JSON; fields missing from a
//! file keep their environment defaults.

pub mod chat;
pub mod chroma;
pub mod sparql;

pub use chat::ChatConfig;
pub use chroma::ChromaConfig;
pub use sparql::SparqlConfig;

use serde::de::DeserializeOwned;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported config format for {0} (expected .yaml, .yml, .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Parse a config file into a config struct, picking the format from the
/// file extension.
pub fn parse_config_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string())),
        "toml" => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
        "json" => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load a config from an optional file path, falling back to the
/// environment-derived defaults.
pub fn load_or_default<T, F>(path: Option<&Path>, default: F) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match path {
        Some(path) => parse_config_file(path),
        None => Ok(default()),
    }
}

/// Load variables from a `.env` file if one exists.
pub fn load_dotenv() {
    if let Ok(path) = dotenv::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn env_parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
