//! Keeps the hosted index in step with the active embedding provider.
//!
//! An index whose dimension differs from the embedder's is dropped and
//! recreated, which discards every stored record. Callers only run this
//! from ingestion or an explicit startup flag.

use std::time::Duration;

use tokio::time::Instant;

use crate::vector::{IndexDescription, IndexSpec, VectorIndex};

use super::error::RagError;

pub async fn ensure_index(
    index: &dyn VectorIndex,
    spec: &IndexSpec,
    poll: Duration,
    timeout: Duration,
) -> Result<IndexDescription, RagError> {
    let started = Instant::now();
    let existing = index.list_indexes().await.map_err(RagError::Index)?;

    let mut needs_create = true;
    if existing.iter().any(|name| name == &spec.name) {
        match index
            .describe_index(&spec.name)
            .await
            .map_err(RagError::Index)?
        {
            Some(current) if current.dimension == spec.dimension => {
                tracing::info!(
                    index = %spec.name,
                    dimension = spec.dimension,
                    "Index already exists with matching dimension"
                );
                needs_create = false;
            }
            Some(current) => {
                tracing::warn!(
                    index = %spec.name,
                    current = current.dimension,
                    expected = spec.dimension,
                    "Index dimension mismatch, deleting and recreating (stored records are lost)"
                );
                index
                    .delete_index(&spec.name)
                    .await
                    .map_err(RagError::Index)?;
                wait_until_gone(index, spec, poll, timeout, started).await?;
            }
            None => {
                tracing::debug!(index = %spec.name, "Index listed but not describable, creating");
            }
        }
    }

    if needs_create {
        tracing::info!(
            index = %spec.name,
            dimension = spec.dimension,
            metric = %spec.metric,
            cloud = %spec.cloud,
            region = %spec.region,
            "Creating index"
        );
        index.create_index(spec).await.map_err(RagError::Index)?;
    }

    wait_until_ready(index, spec, poll, timeout, started).await
}

async fn wait_until_gone(
    index: &dyn VectorIndex,
    spec: &IndexSpec,
    poll: Duration,
    timeout: Duration,
    started: Instant,
) -> Result<(), RagError> {
    loop {
        let names = index.list_indexes().await.map_err(RagError::Index)?;
        if !names.iter().any(|name| name == &spec.name) {
            return Ok(());
        }
        check_deadline(spec, timeout, started)?;
        tokio::time::sleep(poll).await;
    }
}

async fn wait_until_ready(
    index: &dyn VectorIndex,
    spec: &IndexSpec,
    poll: Duration,
    timeout: Duration,
    started: Instant,
) -> Result<IndexDescription, RagError> {
    loop {
        if let Some(description) = index
            .describe_index(&spec.name)
            .await
            .map_err(RagError::Index)?
        {
            if description.ready {
                tracing::info!(index = %spec.name, "Index is ready");
                return Ok(description);
            }
        }
        check_deadline(spec, timeout, started)?;
        tracing::debug!(index = %spec.name, "Waiting for index to become ready");
        tokio::time::sleep(poll).await;
    }
}

fn check_deadline(spec: &IndexSpec, timeout: Duration, started: Instant) -> Result<(), RagError> {
    let waited = started.elapsed();
    if waited >= timeout {
        return Err(RagError::IndexNotReady {
            name: spec.name.clone(),
            waited_secs: waited.as_secs(),
        });
    }
    Ok(())
}
