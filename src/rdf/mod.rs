// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Knowledge graph access and subject document construction

pub mod documents;
pub mod endpoint;
pub mod errors;
pub mod insert;
pub mod local;
pub mod source;

pub use documents::{
    build_documents, get_subjects_docs, make_graph_mask, split_documents_from_endpoint,
    DocumentStrategy, DEFAULT_LANGUAGE, SUBJECT_KEY, TRIPLES_KEY,
};
pub use endpoint::SparqlEndpoint;
pub use errors::KgError;
pub use insert::{
    build_insert_query, chunk_statements, insert_triples, Statement, DEFAULT_INSERT_CHUNK,
};
pub use local::LocalGraph;
pub use source::{
    is_endpoint_url, setup_kg, setup_kg_from_config, QueryRows, RdfTerm, TermKind, TripleStore,
};
