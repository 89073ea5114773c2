// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use kg_llm_node::rdf::{
    build_insert_query, insert_triples, setup_kg, KgError, LocalGraph, TermKind, TripleStore,
};
use std::path::{Path, PathBuf};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test_data.ttl")
}

#[tokio::test]
async fn test_setup_kg_loads_file() {
    let kg = setup_kg(fixture().to_str().unwrap(), None, None).unwrap();
    assert!(kg.location().ends_with("test_data.ttl"));

    let rows = kg
        .select("SELECT ?s WHERE { ?s a <http://example.org/pokemon/Pokemon> } ORDER BY ?s")
        .await
        .unwrap();
    let subjects: Vec<&str> = (0..rows.len())
        .map(|i| rows.get(i, "s").unwrap().value.as_str())
        .collect();
    assert_eq!(
        subjects,
        vec![
            "http://example.org/pokemon/Pikachu",
            "http://example.org/pokemon/Raichu",
            "http://example.org/pokemon/Squirtle",
        ]
    );
}

#[tokio::test]
async fn test_select_keeps_language_tags() {
    let kg = LocalGraph::from_file(&fixture()).unwrap();
    let rows = kg
        .select(
            "SELECT ?l WHERE { <http://example.org/pokemon/Electric> \
             <http://www.w3.org/2000/01/rdf-schema#label> ?l } ORDER BY ?l",
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    let french = (0..rows.len())
        .filter_map(|i| rows.get(i, "l"))
        .find(|t| t.language.as_deref() == Some("fr"))
        .unwrap();
    assert_eq!(french.kind, TermKind::Literal);
    assert_eq!(french.to_ntriples(), "\"Électrique\"@fr");
}

#[tokio::test]
async fn test_ask_query() {
    let kg = LocalGraph::from_file(&fixture()).unwrap();
    let rows = kg
        .select("ASK { <http://example.org/pokemon/Raichu> ?p ?o }")
        .await
        .unwrap();
    assert_eq!(rows.get(0, "boolean").unwrap().value, "true");
}

#[tokio::test]
async fn test_describe_returns_ntriples() {
    let kg = LocalGraph::from_file(&fixture()).unwrap();
    let lines = kg
        .describe("DESCRIBE <http://example.org/pokemon/Squirtle>")
        .await
        .unwrap();
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|l| l.ends_with(" .")));
    assert!(lines
        .iter()
        .any(|l| l.contains("<http://example.org/pokemon/Water>")));
}

#[test]
fn test_unknown_extension() {
    let err = LocalGraph::from_file(Path::new("graph.unknown")).err().unwrap();
    assert!(matches!(err, KgError::UnknownFormat(_)));
}

#[test]
fn test_missing_file() {
    let err = LocalGraph::from_file(Path::new("/nonexistent/graph.ttl"))
        .err()
        .unwrap();
    assert!(matches!(err, KgError::RdfFile { .. }));
}

#[tokio::test]
async fn test_insert_file_into_store() {
    let target = LocalGraph::new().unwrap();
    let count = insert_triples(&fixture(), &target, 5).await.unwrap();

    let source = LocalGraph::from_file(&fixture()).unwrap();
    assert_eq!(count, source.len());
    assert_eq!(target.len(), source.len());
}

#[tokio::test]
async fn test_insert_query_runs_on_store() {
    let source = LocalGraph::from_file(&fixture()).unwrap();
    let statements = source.statements().unwrap();
    let update = build_insert_query(&statements);
    assert!(update.starts_with("INSERT DATA"));

    let target = LocalGraph::new().unwrap();
    target.update(&update).await.unwrap();
    assert_eq!(target.len(), source.len());
}
