//! Document ingestion.
//!
//! Two entry points share the same embedder and index:
//! - `ingest_corpus`: batch mode for the curated text corpus, paced and retried
//! - `ingest_pages`: interactive mode for one uploaded document

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use uuid::Uuid;

use crate::core::config::AppConfig;
use crate::embedding::EmbeddingProvider;
use crate::vector::{RecordMetadata, VectorIndex, VectorRecord};

use super::error::RagError;
use super::retry::RetryPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub chunks_written: usize,
    pub batches_total: usize,
    pub batches_failed: usize,
    pub chunks_skipped: usize,
}

pub struct IngestionPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    index_name: String,
    batch_size: NonZeroUsize,
    batch_interval: Duration,
    retry: RetryPolicy,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            index_name: index_name.into(),
            batch_size: NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN),
            batch_interval: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self::new(embedder, index, config.index.name.clone())
            .with_batch_size(config.ingest.batch_size)
            .with_batch_interval(Duration::from_millis(config.ingest.batch_interval_ms))
            .with_retry(config.ingest.retry.clone())
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = NonZeroUsize::new(batch_size).unwrap_or(NonZeroUsize::MIN);
        self
    }

    /// Minimum spacing between batch starts. Zero disables pacing.
    pub fn with_batch_interval(mut self, interval: Duration) -> Self {
        self.batch_interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Embeds and upserts `units` in fixed-size batches with ids `"0".."n-1"`,
    /// so running it again over the same corpus overwrites instead of
    /// duplicating. A batch that still fails after its retries is logged and
    /// skipped.
    pub async fn ingest_corpus(&self, units: &[String]) -> IngestReport {
        let mut report = IngestReport::default();
        let limiter = self.pacer();
        let batch_size = self.batch_size.get();
        let batch_count = units.len().div_ceil(batch_size);

        tracing::info!(
            index = %self.index_name,
            chunks = units.len(),
            batches = batch_count,
            "Starting corpus ingestion"
        );

        for (batch_number, batch) in units.chunks(batch_size).enumerate() {
            if let Some(limiter) = &limiter {
                limiter.until_ready().await;
            }
            report.batches_total += 1;
            let offset = batch_number * batch_size;

            let label = format!("batch {}/{}", batch_number + 1, batch_count);
            match self
                .retry
                .run(&label, || self.write_corpus_batch(offset, batch))
                .await
            {
                Ok(written) => {
                    report.chunks_written += written;
                    tracing::info!(
                        batch = batch_number + 1,
                        of = batch_count,
                        written,
                        "Upserted batch"
                    );
                }
                Err(err) => {
                    report.batches_failed += 1;
                    report.chunks_skipped += batch.len();
                    tracing::error!(
                        batch = batch_number + 1,
                        of = batch_count,
                        error = %err,
                        "Skipping batch after retries were exhausted"
                    );
                }
            }
        }

        tracing::info!(
            written = report.chunks_written,
            failed_batches = report.batches_failed,
            skipped = report.chunks_skipped,
            "Corpus ingestion finished"
        );
        report
    }

    async fn write_corpus_batch(&self, offset: usize, batch: &[String]) -> Result<usize, RagError> {
        let vectors = self
            .embedder
            .embed_documents(batch)
            .await
            .map_err(RagError::Embedding)?;

        let records = batch
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (text, values))| VectorRecord {
                id: (offset + i).to_string(),
                values,
                metadata: RecordMetadata {
                    text: text.clone(),
                    source: None,
                },
            })
            .collect();

        self.index
            .upsert(&self.index_name, records)
            .await
            .map_err(RagError::Index)
    }

    /// Stores one record per page that has text. Blank pages are dropped
    /// before numbering, so `page_index` counts text-bearing pages only.
    /// Returns the number of pages written; zero means nothing was called.
    pub async fn ingest_pages(&self, source: &str, pages: &[String]) -> Result<usize, RagError> {
        let texts: Vec<String> = pages
            .iter()
            .filter(|page| !page.trim().is_empty())
            .cloned()
            .collect();
        if texts.is_empty() {
            tracing::info!(source, "Document has no extractable text");
            return Ok(0);
        }

        let vectors = self
            .embedder
            .embed_documents(&texts)
            .await
            .map_err(RagError::Embedding)?;

        let records: Vec<VectorRecord> = texts
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(page_index, (text, values))| VectorRecord {
                id: page_record_id(source, page_index),
                values,
                metadata: RecordMetadata {
                    text,
                    source: Some(source.to_string()),
                },
            })
            .collect();

        let written = self
            .index
            .upsert(&self.index_name, records)
            .await
            .map_err(RagError::Index)?;
        tracing::info!(source, pages = written, "Stored uploaded document");
        Ok(written)
    }

    fn pacer(&self) -> Option<DefaultDirectRateLimiter> {
        Quota::with_period(self.batch_interval).map(RateLimiter::direct)
    }
}

fn page_record_id(source: &str, page_index: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_p{}_{}", source, page_index, &suffix[..8])
}
