// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Load an RDF file into a SPARQL endpoint

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::config::SparqlConfig;
use crate::rdf::{insert_triples, is_endpoint_url, SparqlEndpoint, DEFAULT_INSERT_CHUNK};

pub async fn insert_triples_flow(rdf_file: &Path, sparql: &SparqlConfig) -> Result<usize> {
    if !is_endpoint_url(&sparql.endpoint) {
        bail!(
            "Triples can only be inserted into a SPARQL endpoint, got {}",
            sparql.endpoint
        );
    }
    if !rdf_file.is_file() {
        bail!("RDF file not found: {}", rdf_file.display());
    }

    let endpoint = SparqlEndpoint::from_config(sparql)?;
    insert_triples(rdf_file, &endpoint, DEFAULT_INSERT_CHUNK)
        .await
        .with_context(|| {
            format!(
                "Failed to insert {} into {}",
                rdf_file.display(),
                endpoint.update_endpoint()
            )
        })
}
