//! Pinecone REST client.
//!
//! Control-plane calls go to the global controller; data-plane calls go to
//! the per-index host returned by `describe_index`, which is cached until
//! the index is deleted.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use super::index::{
    IndexDescription, IndexMatch, IndexSpec, RecordMetadata, VectorIndex, VectorRecord,
};
use crate::core::errors::ProviderError;

const PROVIDER: &str = "pinecone";
pub const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";

pub struct PineconeIndex {
    controller_url: String,
    api_key: Option<String>,
    namespace: Option<String>,
    client: Client,
    hosts: RwLock<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Deserialize)]
struct IndexModel {
    name: String,
    dimension: usize,
    #[serde(default)]
    metric: String,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

impl From<IndexModel> for IndexDescription {
    fn from(model: IndexModel) -> Self {
        IndexDescription {
            name: model.name,
            dimension: model.dimension,
            metric: model.metric,
            host: model.host.filter(|h| !h.is_empty()),
            ready: model.status.map(|s| s.ready).unwrap_or(false),
        }
    }
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a RecordMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

impl PineconeIndex {
    pub fn new(
        client: Client,
        api_key: Option<String>,
        controller_url: Option<String>,
        namespace: Option<String>,
    ) -> Self {
        let controller_url = controller_url
            .unwrap_or_else(|| DEFAULT_CONTROLLER_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            controller_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            namespace: namespace.filter(|n| !n.is_empty()),
            client,
            hosts: RwLock::new(HashMap::new()),
        }
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials { provider: PROVIDER })?;
        Ok(builder
            .header("Api-Key", key)
            .header("X-Pinecone-API-Version", API_VERSION))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .authed(builder)?
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, e))?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_status(PROVIDER, status, body))
    }

    async fn data_plane_url(&self, index: &str, path: &str) -> Result<String, ProviderError> {
        if let Some(host) = self.hosts.read().await.get(index) {
            return Ok(format!("{}{}", host, path));
        }

        let description = self
            .describe_index(index)
            .await?
            .ok_or_else(|| ProviderError::Status {
                provider: PROVIDER,
                status: 404,
                body: format!("index '{}' not found", index),
            })?;
        let host = description.host.ok_or_else(|| ProviderError::ResponseParse {
            provider: PROVIDER,
            message: format!("index '{}' has no host yet", index),
        })?;
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };
        let base = base.trim_end_matches('/').to_string();

        self.hosts
            .write()
            .await
            .insert(index.to_string(), base.clone());
        Ok(format!("{}{}", base, path))
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn list_indexes(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/indexes", self.controller_url);
        let response = self.send(self.client.get(&url)).await?;
        let list: IndexList = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;
        Ok(list.indexes.into_iter().map(|i| i.name).collect())
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>, ProviderError> {
        let url = format!("{}/indexes/{}", self.controller_url, name);
        let response = match self.send(self.client.get(&url)).await {
            Ok(response) => response,
            Err(ProviderError::Status { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let model: IndexModel = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;
        Ok(Some(model.into()))
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), ProviderError> {
        let url = format!("{}/indexes", self.controller_url);
        let body = json!({
            "name": spec.name,
            "dimension": spec.dimension,
            "metric": spec.metric,
            "spec": {
                "serverless": { "cloud": spec.cloud, "region": spec.region }
            }
        });
        self.send(self.client.post(&url).json(&body)).await?;
        tracing::info!(
            index = spec.name.as_str(),
            dimension = spec.dimension,
            "Pinecone index creation requested"
        );
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), ProviderError> {
        let url = format!("{}/indexes/{}", self.controller_url, name);
        self.send(self.client.delete(&url)).await?;
        self.hosts.write().await.remove(name);
        Ok(())
    }

    async fn upsert(&self, index: &str, records: Vec<VectorRecord>) -> Result<usize, ProviderError> {
        if records.is_empty() {
            return Ok(0);
        }
        let url = self.data_plane_url(index, "/vectors/upsert").await?;
        let vectors: Vec<UpsertVector<'_>> = records
            .iter()
            .map(|r| UpsertVector {
                id: &r.id,
                values: &r.values,
                metadata: &r.metadata,
            })
            .collect();
        let mut body = json!({ "vectors": vectors });
        if let Some(namespace) = &self.namespace {
            body["namespace"] = json!(namespace);
        }

        let response = self.send(self.client.post(&url).json(&body)).await?;
        let payload: UpsertResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;
        Ok(payload.upserted_count.unwrap_or(records.len()))
    }

    async fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ProviderError> {
        let url = self.data_plane_url(index, "/query").await?;
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
        });
        if let Some(namespace) = &self.namespace {
            body["namespace"] = json!(namespace);
        }

        let response = self.send(self.client.post(&url).json(&body)).await?;
        let payload: QueryResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;

        Ok(payload
            .matches
            .into_iter()
            .map(|m| IndexMatch {
                metadata: m
                    .metadata
                    .and_then(|value| serde_json::from_value::<RecordMetadata>(value).ok()),
                id: m.id,
                score: m.score,
            })
            .collect())
    }
}
