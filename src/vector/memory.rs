//! In-process vector index.
//!
//! Keeps records in memory and ranks them with brute-force cosine
//! similarity. Used for local development (`index.provider: memory`) and
//! as the index behind the pipeline tests. Nothing is persisted.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::index::{
    IndexDescription, IndexMatch, IndexSpec, RecordMetadata, VectorIndex, VectorRecord,
};
use crate::core::errors::ProviderError;
use crate::vector_math::rank_descending_by_cosine;

const PROVIDER: &str = "memory";

struct Collection {
    spec: IndexSpec,
    records: BTreeMap<String, (Vec<f32>, RecordMetadata)>,
}

#[derive(Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored in `index`, or `None` if it does not exist.
    pub async fn record_count(&self, index: &str) -> Option<usize> {
        let collections = self.collections.read().await;
        collections.get(index).map(|c| c.records.len())
    }

    pub async fn get(&self, index: &str, id: &str) -> Option<RecordMetadata> {
        let collections = self.collections.read().await;
        collections
            .get(index)
            .and_then(|c| c.records.get(id))
            .map(|(_, metadata)| metadata.clone())
    }
}

fn missing_index(name: &str) -> ProviderError {
    ProviderError::Status {
        provider: PROVIDER,
        status: 404,
        body: format!("index '{}' not found", name),
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn list_indexes(&self) -> Result<Vec<String>, ProviderError> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>, ProviderError> {
        let collections = self.collections.read().await;
        Ok(collections.get(name).map(|c| IndexDescription {
            name: c.spec.name.clone(),
            dimension: c.spec.dimension,
            metric: c.spec.metric.clone(),
            host: None,
            ready: true,
        }))
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), ProviderError> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(&spec.name) {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: 409,
                body: format!("index '{}' already exists", spec.name),
            });
        }
        collections.insert(
            spec.name.clone(),
            Collection {
                spec: spec.clone(),
                records: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), ProviderError> {
        let mut collections = self.collections.write().await;
        collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| missing_index(name))
    }

    async fn upsert(&self, index: &str, records: Vec<VectorRecord>) -> Result<usize, ProviderError> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(index)
            .ok_or_else(|| missing_index(index))?;

        let dimension = collection.spec.dimension;
        if let Some(bad) = records.iter().find(|r| r.values.len() != dimension) {
            return Err(ProviderError::InvalidRequest {
                provider: PROVIDER,
                message: format!(
                    "vector '{}' has dimension {}, index '{}' expects {}",
                    bad.id,
                    bad.values.len(),
                    index,
                    dimension
                ),
            });
        }

        let written = records.len();
        for record in records {
            collection
                .records
                .insert(record.id, (record.values, record.metadata));
        }
        Ok(written)
    }

    async fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ProviderError> {
        let collections = self.collections.read().await;
        let collection = collections.get(index).ok_or_else(|| missing_index(index))?;

        let entries: Vec<(&String, &(Vec<f32>, RecordMetadata))> =
            collection.records.iter().collect();
        let candidates: Vec<Vec<f32>> = entries.iter().map(|(_, (v, _))| v.clone()).collect();
        let ranked = rank_descending_by_cosine(vector, &candidates).map_err(|e| {
            ProviderError::InvalidRequest {
                provider: PROVIDER,
                message: e.to_string(),
            }
        })?;

        Ok(ranked
            .into_iter()
            .take(top_k)
            .map(|(idx, score)| {
                let (id, (_, metadata)) = entries[idx];
                IndexMatch {
                    id: id.clone(),
                    score,
                    metadata: Some(metadata.clone()),
                }
            })
            .collect())
    }
}
