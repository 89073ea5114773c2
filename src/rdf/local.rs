// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-memory graph loaded from an RDF file

use async_trait::async_trait;
use oxigraph::io::RdfFormat;
use oxigraph::model::{GraphName, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

use super::errors::KgError;
use super::insert::Statement;
use super::source::{QueryRows, RdfTerm, TripleStore};

pub struct LocalGraph {
    store: Store,
    source: Option<PathBuf>,
}

/// Pick the RDF serialization from the file extension
pub fn format_from_path(path: &Path) -> Result<RdfFormat, KgError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| KgError::UnknownFormat(path.to_path_buf()))?;

    match extension.as_str() {
        "owl" | "xml" => Ok(RdfFormat::RdfXml),
        ext => RdfFormat::from_extension(ext)
            .ok_or_else(|| KgError::UnknownFormat(path.to_path_buf())),
    }
}

impl LocalGraph {
    pub fn new() -> Result<Self, KgError> {
        let store = Store::new().map_err(|e| KgError::Query(e.to_string()))?;
        Ok(Self {
            store,
            source: None,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, KgError> {
        let format = format_from_path(path)?;
        let file = File::open(path).map_err(|e| KgError::RdfFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut graph = Self::new()?;
        graph
            .store
            .load_from_reader(format, BufReader::new(file))
            .map_err(|e| KgError::RdfFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        graph.source = Some(path.to_path_buf());

        info!("Loaded {} quads from {}", graph.len(), path.display());
        Ok(graph)
    }

    /// Parse RDF from a string, mostly useful for small inline graphs
    pub fn from_data(data: &str, format: RdfFormat) -> Result<Self, KgError> {
        let graph = Self::new()?;
        graph
            .store
            .load_from_reader(format, data.as_bytes())
            .map_err(|e| KgError::RdfFile {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?;
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.store.len().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All quads in the store, rendered as N-Triples terms
    pub fn statements(&self) -> Result<Vec<Statement>, KgError> {
        self.store
            .iter()
            .map(|quad| {
                let quad = quad.map_err(|e| KgError::Query(e.to_string()))?;
                let graph = match &quad.graph_name {
                    GraphName::DefaultGraph => None,
                    GraphName::NamedNode(node) => Some(node.to_string()),
                    GraphName::BlankNode(node) => Some(node.to_string()),
                };
                Ok(Statement {
                    subject: quad.subject.to_string(),
                    predicate: quad.predicate.to_string(),
                    object: quad.object.to_string(),
                    graph,
                })
            })
            .collect()
    }
}

fn convert_term(term: &Term) -> RdfTerm {
    match term {
        Term::NamedNode(node) => RdfTerm::iri(node.as_str()),
        Term::BlankNode(node) => RdfTerm::blank(node.as_str()),
        Term::Literal(literal) => {
            let term = RdfTerm::literal(literal.value());
            match literal.language() {
                Some(lang) => term.with_language(lang),
                None => term.with_datatype(literal.datatype().as_str()),
            }
        }
        Term::Triple(triple) => RdfTerm::literal(triple.to_string()),
    }
}

#[async_trait]
impl TripleStore for LocalGraph {
    async fn select(&self, query: &str) -> Result<QueryRows, KgError> {
        let results = self
            .store
            .query(query)
            .map_err(|e| KgError::Query(e.to_string()))?;

        match results {
            QueryResults::Solutions(solutions) => {
                let variables: Vec<String> = solutions
                    .variables()
                    .iter()
                    .map(|v| v.as_str().to_string())
                    .collect();

                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| KgError::Query(e.to_string()))?;
                    rows.push(
                        variables
                            .iter()
                            .map(|var| solution.get(var.as_str()).map(convert_term))
                            .collect(),
                    );
                }
                Ok(QueryRows { variables, rows })
            }
            QueryResults::Boolean(value) => Ok(QueryRows::boolean(value)),
            QueryResults::Graph(_) => Err(KgError::UnexpectedResultForm("solutions")),
        }
    }

    async fn describe(&self, query: &str) -> Result<Vec<String>, KgError> {
        let results = self
            .store
            .query(query)
            .map_err(|e| KgError::Query(e.to_string()))?;

        match results {
            QueryResults::Graph(triples) => triples
                .map(|triple| {
                    triple
                        .map(|t| format!("{} .", t))
                        .map_err(|e| KgError::Query(e.to_string()))
                })
                .collect(),
            _ => Err(KgError::UnexpectedResultForm("graph")),
        }
    }

    async fn update(&self, update: &str) -> Result<(), KgError> {
        self.store
            .update(update)
            .map_err(|e| KgError::Update(e.to_string()))
    }

    fn location(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "<memory>".to_string(),
        }
    }
}
