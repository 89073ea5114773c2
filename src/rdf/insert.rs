// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Loading RDF files into a triple store with INSERT DATA

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

use super::errors::KgError;
use super::local::LocalGraph;
use super::source::TripleStore;

/// Statements sent per INSERT DATA request
pub const DEFAULT_INSERT_CHUNK: usize = 1000;

/// A quad with terms already rendered in N-Triples syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    /// Named graph, `None` for the default graph
    pub graph: Option<String>,
}

impl Statement {
    fn triple(&self) -> String {
        format!("{} {} {} .", self.subject, self.predicate, self.object)
    }

    fn blank_nodes(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.subject.as_str()),
            Some(self.object.as_str()),
            self.graph.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|term| term.starts_with("_:"))
    }
}

fn find_root(parents: &mut [usize], mut i: usize) -> usize {
    while parents[i] != i {
        parents[i] = parents[parents[i]];
        i = parents[i];
    }
    i
}

/// Split statements into update-sized chunks. Blank node labels are scoped
/// to a single update, so every statement sharing a blank node goes into the
/// same chunk even if that makes the chunk larger than `chunk_size`.
pub fn chunk_statements(statements: &[Statement], chunk_size: usize) -> Vec<Vec<&Statement>> {
    let chunk_size = chunk_size.max(1);
    let mut parents: Vec<usize> = (0..statements.len()).collect();
    let mut owner: HashMap<&str, usize> = HashMap::new();

    for (i, statement) in statements.iter().enumerate() {
        for label in statement.blank_nodes() {
            match owner.get(label) {
                Some(&j) => {
                    let a = find_root(&mut parents, i);
                    let b = find_root(&mut parents, j);
                    if a != b {
                        parents[a.max(b)] = a.min(b);
                    }
                }
                None => {
                    owner.insert(label, i);
                }
            }
        }
    }

    // groups ordered by their first statement
    let mut groups: Vec<Vec<&Statement>> = Vec::new();
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    for (i, statement) in statements.iter().enumerate() {
        let root = find_root(&mut parents, i);
        let index = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[index].push(statement);
    }

    let mut chunks: Vec<Vec<&Statement>> = Vec::new();
    let mut current: Vec<&Statement> = Vec::new();
    for group in groups {
        if !current.is_empty() && current.len() + group.len() > chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
        current.extend(group);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Build an `INSERT DATA` update. Default graph triples come first, named
/// graph quads are grouped into `GRAPH` blocks.
pub fn build_insert_query<S: std::borrow::Borrow<Statement>>(statements: &[S]) -> String {
    let mut default_graph = Vec::new();
    let mut named: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for statement in statements.iter().map(|s| s.borrow()) {
        match &statement.graph {
            None => default_graph.push(statement.triple()),
            Some(graph) => named
                .entry(graph.as_str())
                .or_default()
                .push(statement.triple()),
        }
    }

    let mut query = String::from("INSERT DATA {\n");
    for triple in default_graph {
        query.push_str("    ");
        query.push_str(&triple);
        query.push('\n');
    }
    for (graph, triples) in named {
        query.push_str(&format!("    GRAPH {} {{\n", graph));
        for triple in triples {
            query.push_str("        ");
            query.push_str(&triple);
            query.push('\n');
        }
        query.push_str("    }\n");
    }
    query.push('}');
    query
}

/// Parse an RDF file and insert its statements into the store in chunks.
/// Returns the number of statements sent.
pub async fn insert_triples(
    rdf_file: &Path,
    store: &dyn TripleStore,
    chunk_size: usize,
) -> Result<usize, KgError> {
    let graph = LocalGraph::from_file(rdf_file)?;
    let statements = graph.statements()?;

    if statements.is_empty() {
        info!("No statements found in {}", rdf_file.display());
        return Ok(0);
    }

    for chunk in chunk_statements(&statements, chunk_size) {
        store.update(&build_insert_query(&chunk)).await?;
    }

    info!(
        "Inserted {} statements from {} into {}",
        statements.len(),
        rdf_file.display(),
        store.location()
    );
    Ok(statements.len())
}
