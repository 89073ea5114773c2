// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embeddings through an OpenAI-compatible `/embeddings` API

use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::{Embedder, EmbeddingError};

#[derive(serde::Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(serde::Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(serde::Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    model_name: String,
    api_key: Option<String>,
    /// Learned from the first response
    dimension: AtomicUsize,
}

impl RemoteEmbedder {
    pub fn new(
        endpoint: &str,
        model_name: &str,
        api_key: Option<String>,
    ) -> Result<Self, EmbeddingError> {
        reqwest::Url::parse(endpoint)
            .map_err(|e| EmbeddingError::ModelLoad(format!("invalid URL {}: {}", endpoint, e)))?;

        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Embedding client configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
            api_key,
            dimension: AtomicUsize::new(0),
        })
    }
}

/// Order vectors by their `index` field and check they all match
fn collect_vectors(
    mut data: Vec<EmbeddingData>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if data.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);

    let vectors: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
    if let Some(first) = vectors.first() {
        if let Some(bad) = vectors.iter().find(|v| v.len() != first.len()) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: first.len(),
                actual: bad.len(),
            });
        }
    }
    Ok(vectors)
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            model: &self.model_name,
            input: texts,
        };

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.endpoint))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
        let vectors = collect_vectors(parsed.data, texts.len())?;

        if let Some(first) = vectors.first() {
            let known = self.dimension.load(Ordering::Relaxed);
            if known == 0 {
                self.dimension.store(first.len(), Ordering::Relaxed);
            } else if known != first.len() {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: known,
                    actual: first.len(),
                });
            }
        }

        debug!("Embedded {} texts remotely", vectors.len());
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension.load(Ordering::Relaxed)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
