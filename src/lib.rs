// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod flows;
pub mod llm;
pub mod models;
pub mod rag;
pub mod rdf;
pub mod utils;
pub mod vector;
pub mod version;

pub use config::{ChatConfig, ChromaConfig, SparqlConfig};
pub use models::{Conversation, Message};
pub use rag::{Answer, RagPipeline, SparqlAnswer};
pub use rdf::{DocumentStrategy, TripleStore};
pub use vector::{Document, VectorStore};
