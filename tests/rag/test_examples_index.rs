// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::mocks::{ScriptedModel, WordCountEmbedder};
use kg_llm_node::config::{ChatConfig, ChromaConfig};
use kg_llm_node::flows::index_documents;
use kg_llm_node::rag::{load_sparql_examples, RagPipeline, QUERY_KEY};
use kg_llm_node::vector::{setup_vector_store, Document};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn examples_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/examples")
}

#[test]
fn test_load_fixture_examples() {
    let examples = load_sparql_examples(&examples_dir()).unwrap();
    assert_eq!(examples.len(), 2);
    assert_eq!(examples[0].text, "Which pokemon are electric?");
    assert!(examples[1]
        .metadata_value(QUERY_KEY)
        .unwrap()
        .contains("ex:evolvesFrom"));
    assert!(examples[0]
        .metadata_value("source")
        .unwrap()
        .ends_with("01_electric.sparql"));
}

#[tokio::test]
async fn test_examples_reach_sparql_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let config = ChromaConfig {
        host: "local".to_string(),
        persist_directory: dir.path().to_path_buf(),
        ..ChromaConfig::default()
    };

    let kg_store = setup_vector_store(&config, "test", Arc::new(WordCountEmbedder), false)
        .await
        .unwrap();
    kg_store
        .add(&[Document::new("http://example.org/pokemon/Raichu", "Raichu evolves from Pikachu")])
        .await
        .unwrap();

    let examples_store = setup_vector_store(
        &config,
        &config.collection_examples,
        Arc::new(WordCountEmbedder),
        false,
    )
    .await
    .unwrap();
    let examples = load_sparql_examples(&examples_dir()).unwrap();
    index_documents(examples_store.as_ref(), &examples, 10)
        .await
        .unwrap();

    let llm = Arc::new(ScriptedModel::new("SELECT ?from WHERE { ?s ?p ?from }"));
    let chat = ChatConfig {
        num_examples: 1,
        ..ChatConfig::default()
    };
    let pipeline = RagPipeline::new(kg_store, llm.clone(), chat).with_examples_store(examples_store);

    pipeline
        .generate_sparql("What does Raichu evolve from?", false)
        .await
        .unwrap();

    let prompt = llm.last_prompt();
    assert!(prompt.contains("# What does Raichu evolve from?\nPREFIX ex:"));
    assert!(!prompt.contains("# Which pokemon are electric?"));
    assert!(prompt.contains("Raichu evolves from Pikachu"));
}
