// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// RAG (Retrieval-Augmented Generation) module
// Prompt templating, answer cleanup, query examples and the pipeline tying
// vector retrieval to generation

pub mod errors;
pub mod examples;
pub mod pipeline;
pub mod postprocess;
pub mod prompt;
pub mod setup;

pub use errors::RagError;
pub use examples::{format_examples, load_sparql_examples, parse_sparql_example, QUERY_KEY};
pub use pipeline::{Answer, RagPipeline, RetrievedContext, Source, SparqlAnswer};
pub use postprocess::{
    drop_if_keyword, extract_sparql, keep_first_line, post_process_answer, NOT_FOUND_KEYWORD,
};
pub use prompt::PromptTemplate;
pub use setup::setup_pipeline;
