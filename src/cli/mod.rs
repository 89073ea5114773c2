// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod index;
pub mod query;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{load_dotenv, load_or_default, ChatConfig, ChromaConfig, SparqlConfig};

/// Knowledge graph chatbot tools
#[derive(Parser, Debug)]
#[command(name = "kg-cli")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Index an RDF knowledge graph and ask it questions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed subject documents from the knowledge graph into the vector store
    BuildIndex(index::BuildIndexArgs),

    /// Embed SPARQL question/query examples into the examples collection
    BuildExamples(index::BuildExamplesArgs),

    /// Load an RDF file into the SPARQL endpoint
    InsertTriples(index::InsertTriplesArgs),

    /// Download an RDF dump, optionally decompressing it
    Download(index::DownloadArgs),

    /// Answer a question from the indexed knowledge graph
    Ask(query::AskArgs),

    /// Generate a SPARQL query for a question
    Sparql(query::SparqlArgs),
}

/// Config file locations shared by every command. Missing files fall back
/// to environment variables and defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// YAML, TOML or JSON file with vector store settings
    #[arg(long, env = "CHROMA_CONFIG")]
    pub chroma_config: Option<PathBuf>,

    /// YAML, TOML or JSON file with knowledge graph settings
    #[arg(long, env = "SPARQL_CONFIG")]
    pub sparql_config: Option<PathBuf>,

    /// YAML, TOML or JSON file with language model settings
    #[arg(long, env = "CHAT_CONFIG")]
    pub chat_config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn chroma(&self) -> Result<ChromaConfig> {
        Ok(load_or_default(
            self.chroma_config.as_deref(),
            ChromaConfig::from_env,
        )?)
    }

    pub fn sparql(&self) -> Result<SparqlConfig> {
        Ok(load_or_default(
            self.sparql_config.as_deref(),
            SparqlConfig::from_env,
        )?)
    }

    pub fn chat(&self) -> Result<ChatConfig> {
        Ok(load_or_default(self.chat_config.as_deref(), ChatConfig::from_env)?)
    }
}

/// Parse arguments once the env file is loaded, so `env`-backed flags such
/// as `--chroma-config` can be set from it. Without an explicit file the
/// usual `.env` lookup applies.
pub fn parse_cli<I, T>(env_file: Option<&Path>, args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match env_file {
        Some(path) => {
            if let Err(e) = dotenv::from_path(path) {
                tracing::warn!("Could not load {}: {}", path.display(), e);
            }
        }
        None => load_dotenv(),
    }
    Cli::try_parse_from(args)
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::BuildIndex(args) => index::build_index(args).await,
        Commands::BuildExamples(args) => index::build_examples(args).await,
        Commands::InsertTriples(args) => index::insert_triples(args).await,
        Commands::Download(args) => index::download(args).await,
        Commands::Ask(args) => query::ask(args).await,
        Commands::Sparql(args) => query::sparql(args).await,
    }
}
