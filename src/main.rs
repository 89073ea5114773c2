// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use kg_llm_node::{
    api::{ApiConfig, ApiServer},
    config::{load_dotenv, load_or_default, ChatConfig, ChromaConfig, SparqlConfig},
    rag::setup_pipeline,
};
use std::{env, path::PathBuf, sync::Arc};
use tokio::signal;

fn config_path(var: &str) -> Option<PathBuf> {
    env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();
    load_dotenv();

    println!("🚀 Starting knowledge graph chat server...\n");
    println!("📦 {}", kg_llm_node::version::get_version_string());
    println!("   BUILD VERSION: {}", kg_llm_node::version::VERSION);
    println!("📅 Build Date: {}", kg_llm_node::version::BUILD_DATE);
    println!();

    let chat: ChatConfig =
        load_or_default(config_path("CHAT_CONFIG").as_deref(), ChatConfig::from_env)?;
    let chroma: ChromaConfig =
        load_or_default(config_path("CHROMA_CONFIG").as_deref(), ChromaConfig::from_env)?;
    let sparql: SparqlConfig =
        load_or_default(config_path("SPARQL_CONFIG").as_deref(), SparqlConfig::from_env)?;

    let api_port = env::var("API_PORT").unwrap_or_else(|_| "8080".to_string());
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    println!("🧠 Connecting retrieval pipeline...");
    println!("   Vector store: {}", if chroma.is_local() {
        chroma.persist_directory.display().to_string()
    } else {
        chroma.base_url()
    });
    println!("   Knowledge graph: {}", sparql.endpoint);
    println!("   Language model: {} at {}", chat.model_id, chat.llm_api_url);
    let pipeline = setup_pipeline(&chat, &chroma, Some(&sparql)).await?;
    println!("✅ Pipeline ready");

    let config = ApiConfig {
        listen_addr: format!("{}:{}", api_host, api_port),
        ..Default::default()
    };
    let server = ApiServer::new(config, Arc::new(pipeline)).await?;

    let separator = "=".repeat(60);
    println!("\n{}", separator);
    println!("✅ Server listening on http://{}", server.local_addr());
    println!("   POST /ask     {{\"question\": \"...\"}}");
    println!("   POST /sparql  {{\"question\": \"...\", \"execute\": true}}");
    println!("   GET  /chat    (WebSocket)");
    println!("   GET  /health, /metrics");
    println!("\nPress Ctrl+C to shutdown...");
    println!("{}\n", separator);

    // Wait for shutdown signal
    signal::ctrl_c().await?;

    println!("\n⏹️  Shutting down...");
    server.shutdown().await;

    println!("👋 Goodbye!");
    Ok(())
}
