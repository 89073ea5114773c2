// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::ConfigArgs;
use crate::flows::{self, IndexOptions};
use crate::rdf::{DocumentStrategy, DEFAULT_LANGUAGE};
use crate::utils::io::{download_file, gunzip_file};

/// Arguments for build-index command
#[derive(Args, Debug)]
pub struct BuildIndexArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Delete the collection before indexing
    #[arg(long)]
    pub reset: bool,

    /// Only index subjects of this named graph
    #[arg(long)]
    pub graph: Option<String>,

    /// How subject documents are built
    #[arg(long, value_enum, default_value_t = DocumentStrategy::Annotations)]
    pub strategy: DocumentStrategy,

    /// Language of the labels to use
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub lang: String,
}

/// Arguments for build-examples command
#[derive(Args, Debug)]
pub struct BuildExamplesArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Directory of .sparql/.rq files, each starting with a # question line
    #[arg(long, default_value = "data/examples")]
    pub dir: PathBuf,

    /// Delete the collection before indexing
    #[arg(long)]
    pub reset: bool,
}

/// Arguments for insert-triples command
#[derive(Args, Debug)]
pub struct InsertTriplesArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// RDF file to insert
    pub file: PathBuf,
}

/// Arguments for download command
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// URL of the dump
    pub url: String,

    /// Output file
    #[arg(long, short)]
    pub output: PathBuf,

    /// Decompress a .gz download
    #[arg(long)]
    pub gunzip: bool,
}

pub async fn build_index(args: BuildIndexArgs) -> Result<()> {
    let chroma = args.config.chroma()?;
    let sparql = args.config.sparql()?;
    let options = IndexOptions {
        reset: args.reset,
        graph: args.graph,
        strategy: args.strategy,
        lang: args.lang,
    };

    println!("📚 Indexing {} into {}...", sparql.endpoint, chroma.collection_name);
    let report = flows::build_index(&chroma, &sparql, &options).await?;
    println!(
        "✅ Indexed {} documents in {} batches",
        report.documents, report.batches
    );
    Ok(())
}

pub async fn build_examples(args: BuildExamplesArgs) -> Result<()> {
    let chroma = args.config.chroma()?;

    println!("📝 Indexing examples from {}...", args.dir.display());
    let report = flows::build_examples_index(&chroma, &args.dir, args.reset).await?;
    println!(
        "✅ Indexed {} examples into {}",
        report.documents, chroma.collection_examples
    );
    Ok(())
}

pub async fn insert_triples(args: InsertTriplesArgs) -> Result<()> {
    let sparql = args.config.sparql()?;

    println!("🔗 Inserting {} into {}...", args.file.display(), sparql.endpoint);
    let count = flows::insert_triples_flow(&args.file, &sparql).await?;
    println!("✅ Inserted {} statements", count);
    Ok(())
}

pub async fn download(args: DownloadArgs) -> Result<()> {
    println!("⬇️  Downloading {}...", args.url);
    let bytes = download_file(&args.url, &args.output).await?;
    println!("✅ Saved {} bytes to {}", bytes, args.output.display());

    if args.gunzip {
        let output = gunzip_file(&args.output)?;
        println!("✅ Decompressed to {}", output.display());
    }
    Ok(())
}
