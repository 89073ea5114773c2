// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::mocks::{healthy_state, state_with, DownStore, FixedStore};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
};
use kg_llm_node::api::create_router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_ask_returns_answer_and_sources() {
    let app = create_router(healthy_state("Pikachu is electric.\nMore rambling."));
    let response = app
        .oneshot(post_json("/ask", json!({"question": "What type is Pikachu?"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["question"], "What type is Pikachu?");
    assert_eq!(body["answer"], "Pikachu is electric.");
    assert_eq!(
        body["sources"][0]["subject"],
        "http://example.org/pokemon/Pikachu"
    );
    assert!(body.get("context").is_none());
}

#[tokio::test]
async fn test_ask_rejects_blank_question() {
    let app = create_router(healthy_state("x"));
    let response = app
        .oneshot(post_json("/ask", json!({"question": "   "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["details"]["field"], "question");
}

#[tokio::test]
async fn test_ask_rejects_malformed_json() {
    let app = create_router(healthy_state("x"));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/ask")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_ask_vector_store_down() {
    let app = create_router(state_with(Arc::new(DownStore), Ok("x")));
    let response = app
        .oneshot(post_json("/ask", json!({"question": "Who?"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_ask_model_failure() {
    let store = Arc::new(FixedStore { documents: vec![] });
    let app = create_router(state_with(store, Err(())));
    let response = app
        .oneshot(post_json("/ask", json!({"question": "Who?"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error_type"], "upstream_error");
}

#[tokio::test]
async fn test_sparql_returns_query() {
    let app = create_router(healthy_state(
        "```sparql\nSELECT ?t WHERE { <http://example.org/pokemon/Pikachu> <http://example.org/pokemon/type> ?t }\n```",
    ));
    let response = app
        .oneshot(post_json(
            "/sparql",
            json!({"question": "What type is Pikachu?", "execute": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["query"].as_str().unwrap().starts_with("SELECT ?t"));
    // no knowledge graph attached, so nothing was run
    assert!(body.get("results").is_none());
}

#[tokio::test]
async fn test_sparql_without_query_in_output() {
    let app = create_router(healthy_state("I have no idea."));
    let response = app
        .oneshot(post_json("/sparql", json!({"question": "What type is Pikachu?"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_health_healthy() {
    let app = create_router(healthy_state("x"));
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["documents"], 1);
    assert_eq!(body["model"], "canned");
    assert_eq!(body["examples_enabled"], false);
}

#[tokio::test]
async fn test_health_degraded_when_index_empty() {
    let app = create_router(state_with(Arc::new(FixedStore { documents: vec![] }), Ok("x")));
    let body = body_json(app.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["issues"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_health_reports_store_down() {
    let app = create_router(state_with(Arc::new(DownStore), Ok("x")));
    let body = body_json(app.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(body["status"], "degraded");
    assert!(body.get("documents").is_none());
}

#[tokio::test]
async fn test_metrics_count_requests() {
    let state = healthy_state("fine");
    let app = create_router(state.clone());

    app.clone()
        .oneshot(post_json("/ask", json!({"question": "Who?"})))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json("/ask", json!({"question": ""})))
        .await
        .unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("kg_ask_requests_total 2"));
    assert!(text.contains("kg_errors_total 1"));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_router(healthy_state("x"));
    let response = app.oneshot(get("/v1/models")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_version_route() {
    let app = create_router(healthy_state("x"));
    let body = body_json(app.oneshot(get("/version")).await.unwrap()).await;
    assert_eq!(body["version"], kg_llm_node::version::VERSION_NUMBER);
}
