// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::mocks::{pokemon_docs, CannedModel, FixedStore};
use kg_llm_node::api::{ApiConfig, ApiServer};
use kg_llm_node::config::ChatConfig;
use kg_llm_node::rag::RagPipeline;
use serde_json::{json, Value};
use std::sync::Arc;

async fn start_server() -> ApiServer {
    let pipeline = RagPipeline::new(
        Arc::new(FixedStore {
            documents: pokemon_docs(),
        }),
        Arc::new(CannedModel {
            reply: Ok("Pikachu is electric.".to_string()),
        }),
        ChatConfig::default(),
    );
    let config = ApiConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        ..Default::default()
    };
    ApiServer::new(config, Arc::new(pipeline)).await.unwrap()
}

#[tokio::test]
async fn test_server_answers_over_http() {
    let server = start_server().await;
    let base = format!("http://{}", server.local_addr());
    assert_ne!(server.local_addr().port(), 0);

    let client = reqwest::Client::new();
    let body: Value = client
        .post(format!("{}/ask", base))
        .json(&json!({"question": "What type is Pikachu?"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["answer"], "Pikachu is electric.");

    let health = client.get(format!("{}/health", base)).send().await.unwrap();
    assert!(health.status().is_success());

    let metrics = server.metrics();
    assert_eq!(
        metrics
            .ask_requests
            .load(std::sync::atomic::Ordering::Relaxed),
        1
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_releases_port() {
    let server = start_server().await;
    let addr = server.local_addr();
    server.shutdown().await;

    let result = reqwest::Client::new()
        .get(format!("http://{}/health", addr))
        .timeout(std::time::Duration::from_secs(2))
        .send()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_invalid_listen_addr() {
    let pipeline = RagPipeline::new(
        Arc::new(FixedStore { documents: vec![] }),
        Arc::new(CannedModel {
            reply: Ok(String::new()),
        }),
        ChatConfig::default(),
    );
    let config = ApiConfig {
        listen_addr: "not an address".to_string(),
        ..Default::default()
    };
    assert!(ApiServer::new(config, Arc::new(pipeline)).await.is_err());
}
