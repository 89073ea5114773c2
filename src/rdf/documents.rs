// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Subject-centric documents
//!
//! Every subject in the graph becomes one text document. The text is made of
//! human readable labels so it embeds well, while the original triples ride
//! along in the metadata and are what the language model eventually sees.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::errors::KgError;
use super::source::{RdfTerm, TermKind, TripleStore};
use crate::vector::Document;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Metadata key holding the subject IRI
pub const SUBJECT_KEY: &str = "subject";
/// Metadata key holding N-Triples statements about the subject
pub const TRIPLES_KEY: &str = "triples";

/// How document text is derived from the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStrategy {
    /// One line of labels per triple about the subject
    Labels,
    /// The subject's rdfs:label and rdfs:comment
    #[default]
    Annotations,
}

/// Human readable triples, one row per statement with labelled subject and
/// predicate. Objects use their label, their literal value, or the local
/// name of their IRI.
pub fn triple_label_query(lang: &str, graph_mask: &str) -> String {
    format!(
        r#"
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>

SELECT ?s ?p ?o ?sLab ?pLab ?oClean
WHERE
{{
    ?s ?p ?o .
    ?s rdfs:label ?sLab .
    ?p rdfs:label ?pLab .
    OPTIONAL {{
        ?o rdfs:label ?oLab .
        FILTER(LANG(?oLab) = "{lang}")
    }}
    BIND(COALESCE(?oLab, ?o) AS ?oLabOrUri)
    BIND(
        IF (isLiteral(?o), ?o, STR(?oLabOrUri))
        AS ?oLabOrVal
    )
    FILTER(LANG(?sLab) = "{lang}")
    FILTER(LANG(?pLab) = "{lang}")
    FILTER(LANG(?oLabOrVal) = "{lang}" || LANG(?oLabOrVal) = "")
    BIND (REPLACE(STR(?oLabOrVal), "^.*[#/:]([^/:#]*)$", "$1") as ?oClean)
    {graph_mask}
}}
"#
    )
}

/// Each labelled subject with its optional comment
pub fn subject_doc_query(lang: &str, graph_mask: &str) -> String {
    format!(
        r#"
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>

SELECT ?s ?sLab ?sCom
WHERE
{{
    ?s rdfs:label ?sLab .
    OPTIONAL {{
        ?s rdfs:comment ?sCom .
        FILTER(LANG(?sCom) = "{lang}" || LANG(?sCom) = "")
    }}
    FILTER(LANG(?sLab) = "{lang}" || LANG(?sLab) = "")
    {graph_mask}
}}
ORDER BY ?s
"#
    )
}

/// Restrict subjects to those with statements in the given named graph
pub fn make_graph_mask(graph: Option<&str>) -> String {
    match graph.map(str::trim).filter(|g| !g.is_empty()) {
        Some(graph) => {
            let iri = if graph.starts_with('<') {
                graph.to_string()
            } else {
                format!("<{}>", graph)
            };
            format!("FILTER EXISTS {{ GRAPH {} {{ ?s ?p ?o }} }}", iri)
        }
        None => String::new(),
    }
}

fn check_language(lang: &str) -> Result<(), KgError> {
    let valid = !lang.is_empty()
        && lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(KgError::InvalidLanguage(lang.to_string()))
    }
}

/// Build one document per subject from human readable triple labels.
///
/// Rows with an unbound column are skipped. Subjects are emitted in sorted
/// order and each document is keyed by its subject IRI.
pub async fn split_documents_from_endpoint(
    kg: &dyn TripleStore,
    graph: Option<&str>,
    lang: &str,
) -> Result<Vec<Document>, KgError> {
    check_language(lang)?;
    let query = triple_label_query(lang, &make_graph_mask(graph));
    let results = kg.select(&query).await?;
    debug!("Triple label query returned {} rows", results.len());

    const COLUMNS: [&str; 6] = ["s", "p", "o", "sLab", "pLab", "oClean"];
    let columns: Option<Vec<usize>> = COLUMNS.iter().map(|c| results.column(c)).collect();
    let columns = columns.ok_or_else(|| {
        KgError::InvalidResults(format!(
            "expected columns {:?}, got {:?}",
            COLUMNS, results.variables
        ))
    })?;

    let mut by_subject: BTreeMap<String, Vec<[&RdfTerm; 6]>> = BTreeMap::new();
    let mut dropped = 0usize;
    for row in &results.rows {
        let cells: Option<Vec<&RdfTerm>> = columns.iter().map(|&i| row.get(i)?.as_ref()).collect();
        match cells {
            Some(cells) => {
                let cells = [cells[0], cells[1], cells[2], cells[3], cells[4], cells[5]];
                by_subject
                    .entry(cells[0].to_ntriples())
                    .or_default()
                    .push(cells);
            }
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!("Dropped {} incomplete rows", dropped);
    }

    let docs: Vec<Document> = by_subject
        .into_values()
        .map(|rows| {
            let subject = rows[0][0];
            let text = rows
                .iter()
                .map(|r| format!("{} {} {}", r[3].value, r[4].value, r[5].value))
                .collect::<Vec<_>>()
                .join("\n");
            let triples = rows
                .iter()
                .map(|r| {
                    format!(
                        "{} {} {} .",
                        r[0].to_ntriples(),
                        r[1].to_ntriples(),
                        r[2].to_ntriples()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");

            Document::new(subject.value.clone(), text)
                .with_metadata(SUBJECT_KEY, subject.value.clone())
                .with_metadata(TRIPLES_KEY, triples)
        })
        .collect();

    info!("Built {} subject documents from triple labels", docs.len());
    Ok(docs)
}

/// Build one document per labelled subject from its annotations, attaching
/// the subject's description as N-Triples.
///
/// Blank node subjects cannot be described by IRI and are skipped.
pub async fn get_subjects_docs(
    kg: &dyn TripleStore,
    graph: Option<&str>,
    lang: &str,
) -> Result<Vec<Document>, KgError> {
    check_language(lang)?;
    let query = subject_doc_query(lang, &make_graph_mask(graph));
    let results = kg.select(&query).await?;

    // first label and comment per subject
    let mut subjects: BTreeMap<String, (String, Option<String>)> = BTreeMap::new();
    for row in 0..results.len() {
        let Some(subject) = results.get(row, "s") else {
            continue;
        };
        if subject.kind != TermKind::Iri {
            continue;
        }
        let Some(label) = results.get(row, "sLab") else {
            continue;
        };
        let comment = results.get(row, "sCom").map(|c| c.value.clone());

        let entry = subjects
            .entry(subject.value.clone())
            .or_insert_with(|| (label.value.clone(), None));
        if entry.1.is_none() {
            entry.1 = comment;
        }
    }

    let mut docs = Vec::with_capacity(subjects.len());
    for (subject, (label, comment)) in subjects {
        let text = match comment.filter(|c| !c.trim().is_empty()) {
            Some(comment) => format!("{}\n{}", label.trim(), comment.trim()),
            None => label.trim().to_string(),
        };
        let triples = kg.describe(&format!("DESCRIBE <{}>", subject)).await?;

        docs.push(
            Document::new(subject.clone(), text)
                .with_metadata(SUBJECT_KEY, subject)
                .with_metadata(TRIPLES_KEY, triples.join("\n")),
        );
    }

    info!("Built {} subject documents from annotations", docs.len());
    Ok(docs)
}

/// Build documents with the chosen strategy
pub async fn build_documents(
    kg: &dyn TripleStore,
    strategy: DocumentStrategy,
    graph: Option<&str>,
    lang: &str,
) -> Result<Vec<Document>, KgError> {
    match strategy {
        DocumentStrategy::Labels => split_documents_from_endpoint(kg, graph, lang).await,
        DocumentStrategy::Annotations => get_subjects_docs(kg, graph, lang).await,
    }
}
