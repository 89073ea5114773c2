// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::mocks::{healthy_state, state_with, DownStore};
use kg_llm_node::api::chat::reply_to;
use kg_llm_node::api::{ChatMode, ChatRequest};
use kg_llm_node::models::BOT_SENDER;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn test_plain_text_frame_answered() {
    let state = healthy_state("Pikachu is electric.");
    let request = ChatRequest::from_frame("What type is Pikachu?");
    let reply = reply_to(&state, &request).await;

    assert_eq!(reply.sender, BOT_SENDER);
    assert_eq!(reply.text, "Pikachu is electric.");
    assert!(reply
        .triples
        .unwrap()
        .contains("<http://example.org/pokemon/Electric>"));
}

#[tokio::test]
async fn test_sparql_mode_frame() {
    let state = healthy_state("SELECT ?s WHERE { ?s ?p ?o }");
    let request = ChatRequest::from_frame(r#"{"question": "Everything?", "mode": "sparql"}"#);
    assert_eq!(request.mode, ChatMode::Sparql);

    let reply = reply_to(&state, &request).await;
    assert_eq!(reply.text, "SELECT ?s WHERE { ?s ?p ?o }");
}

#[tokio::test]
async fn test_failure_becomes_bot_message() {
    let state = state_with(Arc::new(DownStore), Ok("x"));
    let reply = reply_to(&state, &ChatRequest::from_frame("Who?")).await;

    assert_eq!(reply.sender, BOT_SENDER);
    assert_eq!(reply.text, "The document index is unavailable");
    assert!(reply.triples.is_none());
    assert_eq!(state.metrics.total_errors.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_blank_frame_rejected() {
    let state = healthy_state("x");
    let reply = reply_to(&state, &ChatRequest::from_frame("  ")).await;
    assert!(reply.text.contains("question"));
}
