// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Knowledge graph connection settings

use serde::{Deserialize, Serialize};

use super::{env_opt, env_or, env_parse_or, ConfigError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default = "SparqlConfig::from_env")]
pub struct SparqlConfig {
    /// SPARQL endpoint URL, or path to an RDF file
    pub endpoint: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Endpoint accepting SPARQL updates (defaults to <endpoint>/statements)
    pub update_endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:7200/repositories/test".to_string(),
            user: Some("admin".to_string()),
            password: Some("admin".to_string()),
            update_endpoint: None,
            timeout_secs: 60,
        }
    }
}

impl SparqlConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env_or("SPARQL_ENDPOINT", &defaults.endpoint),
            user: env_opt("SPARQL_USER").or(defaults.user),
            password: env_opt("SPARQL_PASSWORD").or(defaults.password),
            update_endpoint: env_opt("SPARQL_UPDATE_ENDPOINT"),
            timeout_secs: env_parse_or("SPARQL_TIMEOUT_SECS", defaults.timeout_secs),
        }
    }

    /// Update endpoint, following the GraphDB/RDF4J `/statements` convention
    /// when none is configured.
    pub fn update_url(&self) -> String {
        self.update_endpoint
            .clone()
            .unwrap_or_else(|| format!("{}/statements", self.endpoint.trim_end_matches('/')))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "endpoint".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
