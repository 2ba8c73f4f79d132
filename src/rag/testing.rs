//! In-process collaborators for pipeline and router tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::errors::ProviderError;
use crate::embedding::EmbeddingProvider;
use crate::llm::GenerationProvider;
use crate::vector::{
    IndexDescription, IndexMatch, IndexSpec, MemoryIndex, VectorIndex, VectorRecord,
};

use super::error::RagError;
use super::pdf::PageExtractor;

/// Deterministic embedder: each text maps to a vector derived from its bytes.
pub struct MockEmbedder {
    dimension: usize,
    transient_failures: AtomicU32,
    fail_permanently: bool,
    pub document_calls: AtomicU32,
    pub query_calls: AtomicU32,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            transient_failures: AtomicU32::new(0),
            fail_permanently: false,
            document_calls: AtomicU32::new(0),
            query_calls: AtomicU32::new(0),
        }
    }

    /// The next `n` calls fail with a rate-limit error.
    pub fn failing_transiently(dimension: usize, n: u32) -> Self {
        let embedder = Self::new(dimension);
        embedder.transient_failures.store(n, Ordering::SeqCst);
        embedder
    }

    pub fn failing(dimension: usize) -> Self {
        Self {
            fail_permanently: true,
            ..Self::new(dimension)
        }
    }

    fn check_failure(&self) -> Result<(), ProviderError> {
        if self.fail_permanently {
            return Err(ProviderError::AuthFailed { provider: "mock" });
        }
        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(ProviderError::RateLimited { provider: "mock" });
        }
        Ok(())
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0.0f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            values[i % self.dimension] += byte as f32 / 255.0;
        }
        values[0] += 1.0;
        values
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn name(&self) -> &str {
        "mock"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.vector_for(text))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Wraps `MemoryIndex` and records every call as a short label.
pub struct RecordingIndex {
    inner: MemoryIndex,
    pub calls: Mutex<Vec<String>>,
    pub upserts: Mutex<Vec<Vec<VectorRecord>>>,
    pending_ready_polls: AtomicU32,
    fail_queries: bool,
}

impl RecordingIndex {
    pub fn new() -> Self {
        Self {
            inner: MemoryIndex::new(),
            calls: Mutex::new(Vec::new()),
            upserts: Mutex::new(Vec::new()),
            pending_ready_polls: AtomicU32::new(0),
            fail_queries: false,
        }
    }

    /// Newly created indexes report not-ready for `polls` describe calls.
    pub fn with_ready_delay(polls: u32) -> Self {
        let index = Self::new();
        index.pending_ready_polls.store(polls, Ordering::SeqCst);
        index
    }

    pub fn failing_queries() -> Self {
        Self {
            fail_queries: true,
            ..Self::new()
        }
    }

    pub fn inner(&self) -> &MemoryIndex {
        &self.inner
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upsert_batches(&self) -> Vec<Vec<VectorRecord>> {
        self.upserts.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    fn name(&self) -> &str {
        "recording"
    }

    async fn list_indexes(&self) -> Result<Vec<String>, ProviderError> {
        self.record("list".to_string());
        self.inner.list_indexes().await
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>, ProviderError> {
        self.record(format!("describe:{}", name));
        let description = self.inner.describe_index(name).await?;
        let pending = self.pending_ready_polls.load(Ordering::SeqCst);
        if pending > 0 {
            self.pending_ready_polls.store(pending - 1, Ordering::SeqCst);
            return Ok(description.map(|d| IndexDescription { ready: false, ..d }));
        }
        Ok(description)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), ProviderError> {
        self.record(format!("create:{}:{}", spec.name, spec.dimension));
        self.inner.create_index(spec).await
    }

    async fn delete_index(&self, name: &str) -> Result<(), ProviderError> {
        self.record(format!("delete:{}", name));
        self.inner.delete_index(name).await
    }

    async fn upsert(&self, index: &str, records: Vec<VectorRecord>) -> Result<usize, ProviderError> {
        self.record(format!("upsert:{}:{}", index, records.len()));
        self.upserts.lock().unwrap().push(records.clone());
        self.inner.upsert(index, records).await
    }

    async fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ProviderError> {
        self.record(format!("query:{}:{}", index, top_k));
        if self.fail_queries {
            return Err(ProviderError::Status {
                provider: "recording",
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.inner.query(index, vector, top_k).await
    }
}

/// Returns the prompt it was given, so tests can inspect what was sent.
pub struct EchoGenerator {
    pub prompts: Mutex<Vec<String>>,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GenerationProvider for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(prompt.to_string())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl GenerationProvider for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Status {
            provider: "gemini",
            status: 500,
            body: "model overloaded".to_string(),
        })
    }
}

/// Ignores the uploaded bytes and returns fixed pages.
pub struct StubExtractor {
    pages: Vec<String>,
}

impl StubExtractor {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PageExtractor for StubExtractor {
    fn extract_pages(&self, _bytes: &[u8]) -> Result<Vec<String>, RagError> {
        Ok(self.pages.clone())
    }
}
