// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use kg_llm_node::rdf::{
    build_documents, get_subjects_docs, split_documents_from_endpoint, DocumentStrategy, KgError,
    LocalGraph, SUBJECT_KEY, TRIPLES_KEY,
};
use std::path::Path;

fn graph() -> LocalGraph {
    LocalGraph::from_file(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test_data.ttl"))
        .unwrap()
}

#[tokio::test]
async fn test_label_documents_grouped_by_subject() {
    let kg = graph();
    let docs = split_documents_from_endpoint(&kg, None, "en").await.unwrap();

    // only subjects with labelled predicates produce rows
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "http://example.org/pokemon/Pikachu",
            "http://example.org/pokemon/Raichu",
            "http://example.org/pokemon/Squirtle",
        ]
    );

    let pikachu = &docs[0];
    assert!(pikachu.text.contains("Pikachu type Electric"));
    assert!(pikachu.text.contains("Pikachu height 0.4"));
    assert_eq!(pikachu.text.lines().count(), 2);
    assert_eq!(
        pikachu.metadata_value(SUBJECT_KEY),
        Some("http://example.org/pokemon/Pikachu")
    );

    let triples = pikachu.metadata_value(TRIPLES_KEY).unwrap();
    assert!(triples.contains(
        "<http://example.org/pokemon/Pikachu> <http://example.org/pokemon/type> <http://example.org/pokemon/Electric> ."
    ));

    let raichu = &docs[1];
    assert!(raichu.text.contains("Raichu evolves from Pikachu"));
}

#[tokio::test]
async fn test_annotation_documents() {
    let kg = graph();
    let docs = get_subjects_docs(&kg, None, "en").await.unwrap();

    let pikachu = docs
        .iter()
        .find(|d| d.id == "http://example.org/pokemon/Pikachu")
        .unwrap();
    assert_eq!(pikachu.text, "Pikachu\nAn electric mouse pokemon.");
    assert!(pikachu
        .metadata_value(TRIPLES_KEY)
        .unwrap()
        .contains("<http://example.org/pokemon/Electric>"));

    let raichu = docs
        .iter()
        .find(|d| d.id == "http://example.org/pokemon/Raichu")
        .unwrap();
    assert_eq!(raichu.text, "Raichu");

    // blank node subjects are skipped
    assert!(docs.iter().all(|d| !d.text.contains("Nameless")));
}

#[tokio::test]
async fn test_annotation_language_filter() {
    let kg = graph();
    let docs = get_subjects_docs(&kg, None, "fr").await.unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["http://example.org/pokemon/Electric"]);
    assert_eq!(docs[0].text, "Électrique");
}

#[tokio::test]
async fn test_graph_mask_on_default_graph_data() {
    let kg = graph();
    let docs = build_documents(
        &kg,
        DocumentStrategy::Annotations,
        Some("http://example.org/graphs/missing"),
        "en",
    )
    .await
    .unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn test_invalid_language_rejected() {
    let kg = graph();
    let err = build_documents(&kg, DocumentStrategy::Labels, None, "en\" || true")
        .await
        .unwrap_err();
    assert!(matches!(err, KgError::InvalidLanguage(_)));
}
