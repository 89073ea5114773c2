// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! SPARQL 1.1 protocol client

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::errors::KgError;
use super::source::{QueryRows, RdfTerm, TripleStore};
use crate::config::SparqlConfig;

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
const N_TRIPLES: &str = "application/n-triples";

pub struct SparqlEndpoint {
    client: Client,
    endpoint: String,
    update_endpoint: String,
    credentials: Option<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct SparqlJsonResults {
    #[serde(default)]
    head: SparqlHead,
    results: Option<SparqlBindings>,
    /// Set instead of `results` for ASK queries
    boolean: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SparqlHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SparqlBindings {
    bindings: Vec<HashMap<String, JsonTerm>>,
}

#[derive(Debug, Deserialize)]
struct JsonTerm {
    #[serde(rename = "type")]
    term_type: String,
    value: String,
    #[serde(rename = "xml:lang")]
    lang: Option<String>,
    datatype: Option<String>,
}

impl JsonTerm {
    fn into_term(self) -> RdfTerm {
        match self.term_type.as_str() {
            "uri" => RdfTerm::iri(self.value),
            "bnode" => RdfTerm::blank(self.value),
            _ => {
                let mut term = RdfTerm::literal(self.value);
                term.language = self.lang;
                term.datatype = self.datatype;
                term
            }
        }
    }
}

impl SparqlEndpoint {
    pub fn new(endpoint: &str) -> Result<Self, KgError> {
        Self::with_timeout(endpoint, None, Duration::from_secs(60))
    }

    pub fn from_config(config: &SparqlConfig) -> Result<Self, KgError> {
        let kg = Self::with_timeout(
            &config.endpoint,
            Some(config.update_url()),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(kg.with_credentials(config.user.as_deref(), config.password.as_deref()))
    }

    fn with_timeout(
        endpoint: &str,
        update_endpoint: Option<String>,
        timeout: Duration,
    ) -> Result<Self, KgError> {
        reqwest::Url::parse(endpoint)
            .map_err(|e| KgError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KgError::Network(e.to_string()))?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        let update_endpoint =
            update_endpoint.unwrap_or_else(|| format!("{}/statements", endpoint));

        Ok(Self {
            client,
            endpoint,
            update_endpoint,
            credentials: None,
        })
    }

    /// Basic auth is only sent when both user and password are set
    pub fn with_credentials(mut self, user: Option<&str>, password: Option<&str>) -> Self {
        self.credentials = match (user, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => {
                Some((u.to_string(), p.to_string()))
            }
            _ => None,
        };
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn update_endpoint(&self) -> &str {
        &self.update_endpoint
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request,
        }
    }

    async fn post_query(&self, query: &str, accept: &str) -> Result<reqwest::Response, KgError> {
        debug!("SPARQL query to {}: {}", self.endpoint, query);
        let request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, accept)
            .form(&[("query", query)]);

        let response = self.authorize(request).send().await?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, KgError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(KgError::Unauthorized),
        _ => {
            let message = response.text().await.unwrap_or_default();
            warn!("SPARQL endpoint error {}: {}", status, message);
            Err(KgError::Endpoint {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn parse_results(body: &str) -> Result<QueryRows, KgError> {
    let parsed: SparqlJsonResults =
        serde_json::from_str(body).map_err(|e| KgError::InvalidResults(e.to_string()))?;

    let results = match (parsed.results, parsed.boolean) {
        (Some(results), _) => results,
        (None, Some(value)) => return Ok(QueryRows::boolean(value)),
        (None, None) => {
            return Err(KgError::InvalidResults(
                "neither results nor boolean in response".to_string(),
            ))
        }
    };

    let variables = parsed.head.vars;
    let rows = results
        .bindings
        .into_iter()
        .map(|mut binding| {
            variables
                .iter()
                .map(|var| binding.remove(var).map(JsonTerm::into_term))
                .collect()
        })
        .collect();

    Ok(QueryRows { variables, rows })
}

/// Keep statement lines, dropping blanks and comments
fn parse_ntriples_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl TripleStore for SparqlEndpoint {
    async fn select(&self, query: &str) -> Result<QueryRows, KgError> {
        let response = self.post_query(query, SPARQL_RESULTS_JSON).await?;
        let body = response.text().await?;
        parse_results(&body)
    }

    async fn describe(&self, query: &str) -> Result<Vec<String>, KgError> {
        let response = self.post_query(query, N_TRIPLES).await?;
        let body = response.text().await?;
        Ok(parse_ntriples_lines(&body))
    }

    async fn update(&self, update: &str) -> Result<(), KgError> {
        debug!("SPARQL update to {}", self.update_endpoint);
        let request = self
            .client
            .post(&self.update_endpoint)
            .form(&[("update", update)]);

        let response = self.authorize(request).send().await?;
        check_status(response).await?;
        Ok(())
    }

    fn location(&self) -> String {
        self.endpoint.clone()
    }
}
