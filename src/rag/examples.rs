// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Question/query example files
//!
//! An example file holds a natural language question as a comment on the
//! first line, followed by the SPARQL query answering it:
//!
//! ```text
//! # Which pokemon are electric?
//! SELECT ?p WHERE { ?p ex:type ex:Electric }
//! ```

use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

use super::errors::RagError;
use crate::vector::Document;

/// Metadata key holding the example's SPARQL query
pub const QUERY_KEY: &str = "query";

const EXAMPLE_EXTENSIONS: [&str; 2] = ["sparql", "rq"];

/// Parse one example into a document whose text is the question and whose
/// `query` metadata is the SPARQL query
pub fn parse_sparql_example(text: &str) -> Result<Document, RagError> {
    let text = text.trim_start_matches('\u{feff}');
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));

    let question = first
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| RagError::Examples("first line must be a # question".to_string()))?
        .trim();
    if question.is_empty() {
        return Err(RagError::Examples("question is empty".to_string()));
    }

    let query = rest.trim_end();
    if query.trim().is_empty() {
        return Err(RagError::Examples(format!("no query for question {:?}", question)));
    }

    Ok(Document::new(Uuid::new_v4().to_string(), question).with_metadata(QUERY_KEY, query))
}

/// Load every `.sparql`/`.rq` file in a directory, in file name order.
/// Files that do not parse are skipped with a warning.
pub fn load_sparql_examples(dir: &Path) -> Result<Vec<Document>, RagError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| RagError::Examples(format!("{}: {}", dir.display(), e)))?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| EXAMPLE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| RagError::Examples(format!("{}: {}", path.display(), e)))?;
        match parse_sparql_example(&content) {
            Ok(doc) => {
                debug!("Loaded example {}", path.display());
                docs.push(doc.with_metadata("source", path.display().to_string()));
            }
            Err(e) => warn!("Skipping example {}: {}", path.display(), e),
        }
    }
    Ok(docs)
}

/// Render retrieved examples for the SPARQL prompt, one
/// `# question` / query block per example
pub fn format_examples(examples: &[Document]) -> String {
    examples
        .iter()
        .filter_map(|doc| {
            doc.metadata_value(QUERY_KEY)
                .map(|query| format!("# {}\n{}", doc.text, query))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
