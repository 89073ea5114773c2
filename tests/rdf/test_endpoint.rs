// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use kg_llm_node::config::SparqlConfig;
use kg_llm_node::rdf::{is_endpoint_url, setup_kg_from_config, KgError, SparqlEndpoint, TripleStore};

#[test]
fn test_endpoint_detection() {
    assert!(is_endpoint_url("http://localhost:7200/repositories/test"));
    assert!(is_endpoint_url("https://query.wikidata.org/sparql"));
    assert!(!is_endpoint_url("data/graph.ttl"));
    assert!(!is_endpoint_url("/abs/path/graph.nt"));
}

#[test]
fn test_config_update_endpoint() {
    let config = SparqlConfig {
        endpoint: "http://localhost:7200/repositories/test".to_string(),
        update_endpoint: Some("http://localhost:7200/repositories/test/update".to_string()),
        ..SparqlConfig::default()
    };
    let endpoint = SparqlEndpoint::from_config(&config).unwrap();
    assert_eq!(
        endpoint.update_endpoint(),
        "http://localhost:7200/repositories/test/update"
    );
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let config = SparqlConfig {
        endpoint: "http://127.0.0.1:59999/repositories/test".to_string(),
        timeout_secs: 2,
        ..SparqlConfig::default()
    };
    let kg = setup_kg_from_config(&config).unwrap();
    let err = kg.select("SELECT * WHERE { ?s ?p ?o } LIMIT 1").await.unwrap_err();
    assert!(matches!(err, KgError::Network(_)));
}

#[tokio::test]
#[ignore] // Requires a running GraphDB/Fuseki at SPARQL_ENDPOINT
async fn test_live_endpoint_select() {
    let config = SparqlConfig::from_env();
    let kg = setup_kg_from_config(&config).unwrap();
    let rows = kg
        .select("SELECT ?s WHERE { ?s ?p ?o } LIMIT 5")
        .await
        .unwrap();
    assert!(rows.len() <= 5);
}
