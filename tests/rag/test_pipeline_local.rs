// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Full retrieve-then-generate runs over the fixture graph, with the local
// vector store and scripted language model

use super::mocks::{ScriptedModel, WordCountEmbedder};
use kg_llm_node::config::{ChatConfig, ChromaConfig};
use kg_llm_node::flows::index_documents;
use kg_llm_node::rag::{RagError, RagPipeline};
use kg_llm_node::rdf::{build_documents, DocumentStrategy, LocalGraph, TripleStore};
use kg_llm_node::vector::{setup_vector_store, VectorStore};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn fixture_graph() -> Arc<LocalGraph> {
    Arc::new(
        LocalGraph::from_file(
            &Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test_data.ttl"),
        )
        .unwrap(),
    )
}

async fn indexed_store(dir: &TempDir, kg: &dyn TripleStore) -> Arc<dyn VectorStore> {
    let config = ChromaConfig {
        host: "local".to_string(),
        persist_directory: dir.path().to_path_buf(),
        batch_size: 2,
        ..ChromaConfig::default()
    };
    let store = setup_vector_store(&config, "test", Arc::new(WordCountEmbedder), true)
        .await
        .unwrap();
    let docs = build_documents(kg, DocumentStrategy::Annotations, None, "en")
        .await
        .unwrap();
    let report = index_documents(store.as_ref(), &docs, config.batch_size)
        .await
        .unwrap();
    assert_eq!(report.documents, docs.len());
    store
}

#[tokio::test]
async fn test_answer_grounded_in_triples() {
    let dir = tempfile::tempdir().unwrap();
    let kg = fixture_graph();
    let store = indexed_store(&dir, kg.as_ref()).await;
    let llm = Arc::new(ScriptedModel::new(
        "Pikachu is an electric type pokemon.\nQuestion: anything else?",
    ));
    let config = ChatConfig {
        num_context_docs: 2,
        ..ChatConfig::default()
    };
    let pipeline = RagPipeline::new(store, llm.clone(), config);

    let answer = pipeline.answer("Which pokemon is electric?").await.unwrap();
    assert_eq!(answer.answer, "Pikachu is an electric type pokemon.");
    assert_eq!(answer.sources.len(), 2);
    assert!(answer
        .sources
        .iter()
        .any(|s| s.subject.as_deref() == Some("http://example.org/pokemon/Pikachu")));

    // the prompt carries the triples, not the label text
    let prompt = llm.last_prompt();
    assert!(prompt.contains("<http://example.org/pokemon/Pikachu>"));
    assert!(prompt.contains("Question: Which pokemon is electric?"));
    assert!(answer.context.contains(" ."));
}

#[tokio::test]
async fn test_sparql_generated_and_executed() {
    let dir = tempfile::tempdir().unwrap();
    let kg = fixture_graph();
    let store = indexed_store(&dir, kg.as_ref()).await;
    let llm = Arc::new(ScriptedModel::new(
        "Here you go:\n```sparql\nPREFIX ex: <http://example.org/pokemon/>\n\
         SELECT ?p WHERE { ?p ex:type ex:Electric } ORDER BY ?p\n```",
    ));
    let pipeline = RagPipeline::new(store, llm, ChatConfig::default()).with_triple_store(kg);

    let result = pipeline
        .generate_sparql("Which pokemon are electric?", true)
        .await
        .unwrap();
    assert!(result.query.starts_with("PREFIX ex:"));

    let rows = result.results.unwrap();
    let found: Vec<&str> = (0..rows.len())
        .map(|i| rows.get(i, "p").unwrap().value.as_str())
        .collect();
    assert_eq!(
        found,
        vec![
            "http://example.org/pokemon/Pikachu",
            "http://example.org/pokemon/Raichu"
        ]
    );
}

#[tokio::test]
async fn test_broken_generated_query() {
    let dir = tempfile::tempdir().unwrap();
    let kg = fixture_graph();
    let store = indexed_store(&dir, kg.as_ref()).await;
    let llm = Arc::new(ScriptedModel::new("SELECT ?p WHERE { ?p ex:type"));
    let pipeline = RagPipeline::new(store, llm, ChatConfig::default()).with_triple_store(kg);

    let err = pipeline
        .generate_sparql("Which pokemon are electric?", true)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::QueryExecution(_)));
}

#[tokio::test]
async fn test_query_not_run_without_execute() {
    let dir = tempfile::tempdir().unwrap();
    let kg = fixture_graph();
    let store = indexed_store(&dir, kg.as_ref()).await;
    let llm = Arc::new(ScriptedModel::new("SELECT ?p WHERE { ?p ?q ?r }"));
    let pipeline = RagPipeline::new(store, llm, ChatConfig::default()).with_triple_store(kg);

    let result = pipeline.generate_sparql("Anything?", false).await.unwrap();
    assert!(result.results.is_none());
}
