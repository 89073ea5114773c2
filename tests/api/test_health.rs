// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::mocks::{pokemon_docs, FixedStore};
use async_trait::async_trait;
use kg_llm_node::api::{ApiConfig, AppState};
use kg_llm_node::config::ChatConfig;
use kg_llm_node::llm::{Generation, LanguageModel, LlmError};
use kg_llm_node::rag::RagPipeline;
use mockall::mock;
use std::sync::Arc;

mock! {
    pub Model {}

    #[async_trait]
    impl LanguageModel for Model {
        async fn generate(&self, prompt: &str) -> Result<Generation, LlmError>;
        fn model_name(&self) -> &str;
        async fn health_check(&self) -> bool;
    }
}

fn state(documents: usize, model: MockModel) -> AppState {
    let store = FixedStore {
        documents: pokemon_docs().into_iter().take(documents).collect(),
    };
    let pipeline = RagPipeline::new(Arc::new(store), Arc::new(model), ChatConfig::default());
    AppState::new(Arc::new(pipeline), ApiConfig::default())
}

fn model(reachable: bool) -> MockModel {
    let mut model = MockModel::new();
    model
        .expect_model_name()
        .return_const("mistral-7b".to_string());
    model.expect_health_check().times(1).return_const(reachable);
    model.expect_generate().never();
    model
}

#[tokio::test]
async fn test_unreachable_model_degrades() {
    let health = state(1, model(false)).health_check().await;
    assert_eq!(health.status, "degraded");
    assert_eq!(health.model, "mistral-7b");
    assert_eq!(
        health.issues,
        Some(vec!["Language model unreachable".to_string()])
    );
}

#[tokio::test]
async fn test_two_issues_unhealthy() {
    let health = state(0, model(false)).health_check().await;
    assert_eq!(health.status, "unhealthy");
    assert_eq!(health.documents, Some(0));
    assert_eq!(health.issues.map(|i| i.len()), Some(2));
}

#[tokio::test]
async fn test_all_good() {
    let health = state(1, model(true)).health_check().await;
    assert_eq!(health.status, "healthy");
    assert!(health.issues.is_none());
    assert!(!health.kg_attached);
}
