// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch jobs run from the command line

pub mod build_examples;
pub mod build_index;
pub mod insert_triples;

pub use build_examples::build_examples_index;
pub use build_index::{build_index, index_documents, IndexOptions, IndexReport};
pub use insert_triples::insert_triples_flow;
