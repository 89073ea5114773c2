// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Triple source abstraction
//!
//! A knowledge graph is either a remote SPARQL endpoint or a local RDF file
//! loaded into memory. Both answer SELECT and DESCRIBE queries and accept
//! updates through the [`TripleStore`] trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::endpoint::SparqlEndpoint;
use super::errors::KgError;
use super::local::LocalGraph;

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    Iri,
    BlankNode,
    Literal,
}

/// A single RDF term as returned in query results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdfTerm {
    pub kind: TermKind,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

impl RdfTerm {
    pub fn iri(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Iri,
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn blank(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::BlankNode,
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    pub fn is_literal(&self) -> bool {
        self.kind == TermKind::Literal
    }

    /// Render the term in N-Triples syntax
    pub fn to_ntriples(&self) -> String {
        match self.kind {
            TermKind::Iri => format!("<{}>", self.value),
            TermKind::BlankNode => format!("_:{}", self.value),
            TermKind::Literal => {
                let mut out = format!("\"{}\"", escape_literal(&self.value));
                if let Some(lang) = &self.language {
                    out.push('@');
                    out.push_str(lang);
                } else if let Some(dt) = self.datatype.as_deref().filter(|dt| *dt != XSD_STRING) {
                    out.push_str("^^<");
                    out.push_str(dt);
                    out.push('>');
                }
                out
            }
        }
    }
}

impl fmt::Display for RdfTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Tabular SELECT results. Unbound cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRows {
    pub variables: Vec<String>,
    pub rows: Vec<Vec<Option<RdfTerm>>>,
}

impl QueryRows {
    /// Single `boolean` cell holding an ASK result
    pub fn boolean(value: bool) -> Self {
        Self {
            variables: vec!["boolean".to_string()],
            rows: vec![vec![Some(
                RdfTerm::literal(value.to_string())
                    .with_datatype("http://www.w3.org/2001/XMLSchema#boolean"),
            )]],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, variable: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == variable)
    }

    /// Cell lookup by row index and variable name
    pub fn get(&self, row: usize, variable: &str) -> Option<&RdfTerm> {
        let col = self.column(variable)?;
        self.rows.get(row)?.get(col)?.as_ref()
    }
}

#[async_trait]
pub trait TripleStore: Send + Sync {
    /// Run a SELECT query
    async fn select(&self, query: &str) -> Result<QueryRows, KgError>;

    /// Run a DESCRIBE or CONSTRUCT query, returning N-Triples statements
    async fn describe(&self, query: &str) -> Result<Vec<String>, KgError>;

    /// Run a SPARQL update
    async fn update(&self, update: &str) -> Result<(), KgError>;

    /// Human readable location of the graph
    fn location(&self) -> String;
}

/// True when the value looks like a URL with both scheme and host
pub fn is_endpoint_url(endpoint: &str) -> bool {
    match url::Url::parse(endpoint) {
        Ok(url) => url.host_str().map(|h| !h.is_empty()).unwrap_or(false),
        Err(_) => false,
    }
}

/// Connect to a SPARQL endpoint, or load a local RDF file when the value
/// is not a URL.
pub fn setup_kg(
    endpoint: &str,
    user: Option<&str>,
    password: Option<&str>,
) -> Result<Arc<dyn TripleStore>, KgError> {
    if is_endpoint_url(endpoint) {
        info!("Using SPARQL endpoint {}", endpoint);
        let kg = SparqlEndpoint::new(endpoint)?.with_credentials(user, password);
        Ok(Arc::new(kg))
    } else {
        info!("Loading RDF file {}", endpoint);
        Ok(Arc::new(LocalGraph::from_file(Path::new(endpoint))?))
    }
}

/// Build the knowledge graph from a SPARQL config, honouring its update
/// endpoint and timeout.
pub fn setup_kg_from_config(
    config: &crate::config::SparqlConfig,
) -> Result<Arc<dyn TripleStore>, KgError> {
    if is_endpoint_url(&config.endpoint) {
        info!("Using SPARQL endpoint {}", config.endpoint);
        let kg = SparqlEndpoint::from_config(config)?;
        Ok(Arc::new(kg))
    } else {
        setup_kg(
            &config.endpoint,
            config.user.as_deref(),
            config.password.as_deref(),
        )
    }
}
