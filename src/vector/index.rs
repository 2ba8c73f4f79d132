//! VectorIndex trait: abstract interface over the hosted vector store.
//!
//! Covers both the data plane (upsert, top-k query) and the small slice of
//! the control plane ingestion needs to keep the index dimension in sync
//! with the active embedding provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ProviderError;

/// Metadata stored next to every vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One `(id, vector, metadata)` triple written by ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// A single query hit, in the order the index ranked it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub id: String,
    /// Cosine similarity (higher = better).
    pub score: f32,
    /// `None` when the record was stored without metadata.
    pub metadata: Option<RecordMetadata>,
}

/// Parameters used when creating an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub cloud: String,
    pub region: String,
}

impl IndexSpec {
    pub fn cosine(name: &str, dimension: usize, cloud: &str, region: &str) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            metric: "cosine".to_string(),
            cloud: cloud.to_string(),
            region: region.to_string(),
        }
    }
}

/// What the control plane reports about an existing index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub host: Option<String>,
    pub ready: bool,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name for logs and the health endpoint.
    fn name(&self) -> &str;

    /// Names of every index visible to the configured credentials.
    async fn list_indexes(&self) -> Result<Vec<String>, ProviderError>;

    /// `Ok(None)` when no index with that name exists.
    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>, ProviderError>;

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), ProviderError>;

    async fn delete_index(&self, name: &str) -> Result<(), ProviderError>;

    /// Insert-or-replace by id. Returns the number of records written.
    async fn upsert(&self, index: &str, records: Vec<VectorRecord>) -> Result<usize, ProviderError>;

    /// Top-k nearest records with metadata, similarity-descending.
    async fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ProviderError>;
}
