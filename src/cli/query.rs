// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Args;

use super::ConfigArgs;
use crate::rag::setup_pipeline;
use crate::rdf::QueryRows;

/// Arguments for ask command
#[derive(Args, Debug)]
pub struct AskArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Question in natural language
    pub question: String,

    /// Print the retrieved context
    #[arg(long)]
    pub show_context: bool,
}

/// Arguments for sparql command
#[derive(Args, Debug)]
pub struct SparqlArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Question in natural language
    pub question: String,

    /// Run the generated query against the knowledge graph
    #[arg(long)]
    pub execute: bool,
}

fn print_rows(rows: &QueryRows) {
    println!("{}", rows.variables.join("\t"));
    for row in &rows.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|term| term.as_ref().map(|t| t.to_ntriples()).unwrap_or_default())
            .collect();
        println!("{}", cells.join("\t"));
    }
    println!("({} rows)", rows.len());
}

pub async fn ask(args: AskArgs) -> Result<()> {
    let chat = args.config.chat()?;
    let chroma = args.config.chroma()?;
    let pipeline = setup_pipeline(&chat, &chroma, None).await?;

    let answer = pipeline.answer(&args.question).await?;
    if args.show_context {
        println!("📄 Context:\n{}\n", answer.context);
    }
    println!("💬 {}", answer.answer);
    for source in &answer.sources {
        println!(
            "   • {} ({:.3})",
            source.subject.as_deref().unwrap_or(&source.id),
            source.distance
        );
    }
    Ok(())
}

pub async fn sparql(args: SparqlArgs) -> Result<()> {
    let chat = args.config.chat()?;
    let chroma = args.config.chroma()?;
    let sparql = if args.execute {
        Some(args.config.sparql()?)
    } else {
        None
    };
    let pipeline = setup_pipeline(&chat, &chroma, sparql.as_ref()).await?;

    let answer = pipeline.generate_sparql(&args.question, args.execute).await?;
    println!("{}", answer.query);
    if let Some(rows) = &answer.results {
        println!();
        print_rows(rows);
    }
    Ok(())
}
