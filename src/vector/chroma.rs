// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chroma REST client (API v1)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{Document, RetrievedDocument, VectorStore, VectorStoreError};
use crate::embeddings::Embedder;

#[derive(Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Deserialize)]
struct CollectionResponse {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<Vec<f32>>,
    documents: Vec<&'a str>,
    /// Chroma rejects empty metadata maps, so those are sent as null
    metadatas: Vec<Option<&'a BTreeMap<String, String>>>,
}

#[derive(Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<HashMap<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

pub struct ChromaStore {
    client: Client,
    base_url: String,
    collection: String,
    collection_id: String,
    embedder: Arc<dyn Embedder>,
}

impl ChromaStore {
    /// Get or create the collection. With `reset` it is deleted first.
    pub async fn connect(
        base_url: &str,
        collection: &str,
        embedder: Arc<dyn Embedder>,
        reset: bool,
    ) -> Result<Self, VectorStoreError> {
        reqwest::Url::parse(base_url)
            .map_err(|e| VectorStoreError::Network(format!("invalid URL {}: {}", base_url, e)))?;
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        heartbeat(&client, &base_url).await?;

        if reset {
            delete_collection(&client, &base_url, collection).await?;
        }

        let response = client
            .post(format!("{}/api/v1/collections", base_url))
            .json(&CreateCollectionRequest {
                name: collection,
                get_or_create: true,
            })
            .send()
            .await?;
        let created: CollectionResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;

        info!("Connected to Chroma collection {} ({})", created.name, created.id);
        Ok(Self {
            client,
            base_url,
            collection: created.name,
            collection_id: created.id,
            embedder,
        })
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    fn collection_url(&self, action: &str) -> String {
        format!(
            "{}/api/v1/collections/{}/{}",
            self.base_url, self.collection_id, action
        )
    }
}

/// Check that the Chroma server is up
pub async fn heartbeat(client: &Client, base_url: &str) -> Result<(), VectorStoreError> {
    let response = client
        .get(format!("{}/api/v1/heartbeat", base_url))
        .send()
        .await?;
    check_status(response).await?;
    debug!("Chroma heartbeat ok at {}", base_url);
    Ok(())
}

/// Delete a collection by name. A missing collection is not an error.
pub async fn delete_collection(
    client: &Client,
    base_url: &str,
    collection: &str,
) -> Result<(), VectorStoreError> {
    let response = client
        .delete(format!("{}/api/v1/collections/{}", base_url, collection))
        .send()
        .await?;

    match check_status(response).await {
        Ok(_) => {
            info!("Deleted Chroma collection {}", collection);
            Ok(())
        }
        Err(VectorStoreError::CollectionNotFound(_)) => {
            debug!("Collection {} did not exist", collection);
            Ok(())
        }
        // older Chroma releases report a missing collection as a 500 ValueError
        Err(VectorStoreError::Api { message, .. }) if message.contains("does not exist") => {
            debug!("Collection {} did not exist", collection);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, VectorStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(VectorStoreError::CollectionNotFound(message));
    }
    warn!("Chroma returned {}: {}", status, message);
    Err(VectorStoreError::Api {
        status: status.as_u16(),
        message,
    })
}

fn metadata_to_strings(metadata: HashMap<String, Value>) -> BTreeMap<String, String> {
    metadata
        .into_iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, value)
        })
        .collect()
}

/// Flatten the first (only) query's nested result arrays
fn parse_query_response(response: QueryResponse) -> Vec<RetrievedDocument> {
    let ids = response.ids.into_iter().next().unwrap_or_default();
    let mut documents = response
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default()
        .into_iter();
    let mut metadatas = response
        .metadatas
        .and_then(|m| m.into_iter().next())
        .unwrap_or_default()
        .into_iter();
    let mut distances = response
        .distances
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default()
        .into_iter();

    ids.into_iter()
        .map(|id| {
            let text = documents.next().flatten().unwrap_or_default();
            let metadata = metadatas
                .next()
                .flatten()
                .map(metadata_to_strings)
                .unwrap_or_default();
            let distance = distances.next().unwrap_or(f32::MAX);
            RetrievedDocument {
                document: Document { id, text, metadata },
                distance,
            }
        })
        .collect()
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn add(&self, documents: &[Document]) -> Result<(), VectorStoreError> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let request = UpsertRequest {
            ids: documents.iter().map(|d| d.id.as_str()).collect(),
            embeddings,
            documents: documents.iter().map(|d| d.text.as_str()).collect(),
            metadatas: documents
                .iter()
                .map(|d| Some(&d.metadata).filter(|m| !m.is_empty()))
                .collect(),
        };

        let response = self
            .client
            .post(self.collection_url("upsert"))
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;

        debug!("Upserted {} documents into {}", documents.len(), self.collection);
        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievedDocument>, VectorStoreError> {
        if n_results == 0 {
            return Ok(vec![]);
        }

        let embedding = self.embedder.embed(text).await?;
        let request = QueryRequest {
            query_embeddings: vec![embedding],
            n_results,
            include: vec!["documents", "metadatas", "distances"],
        };

        let response = self
            .client
            .post(self.collection_url("query"))
            .json(&request)
            .send()
            .await?;
        let parsed: QueryResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;

        Ok(parse_query_response(parsed))
    }

    async fn count(&self) -> Result<usize, VectorStoreError> {
        let response = self.client.get(self.collection_url("count")).send().await?;
        check_status(response)
            .await?
            .json::<usize>()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))
    }

    fn name(&self) -> &str {
        &self.collection
    }
}
