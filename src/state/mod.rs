use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{AppConfig, ConfigService, IndexProviderKind, SplitMode};
use crate::embedding::{self, EmbeddingProvider};
use crate::llm::{self, GenerationProvider};
use crate::rag::{
    ensure_index, load_corpus, IngestReport, IngestionPipeline, LopdfExtractor, PageExtractor,
    QueryPipeline, RagError,
};
use crate::vector::{self, IndexDescription, IndexSpec, VectorIndex};

pub mod error;

use error::InitializationError;

/// Shared application state handed to every route.
///
/// Holds the typed configuration and one instance of each external
/// collaborator. Pipelines borrow the same `Arc`s, so a test can swap any
/// collaborator through `from_parts`.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub index: Arc<dyn VectorIndex>,
    pub generator: Arc<dyn GenerationProvider>,
    pub extractor: Arc<dyn PageExtractor>,
    pub query: QueryPipeline,
    pub ingestion: IngestionPipeline,
}

impl AppState {
    /// Loads configuration and builds the provider clients.
    ///
    /// Nothing here talks to the network; missing credentials surface on
    /// the first call that needs them.
    pub fn initialize(config_service: &ConfigService) -> Result<Arc<Self>, InitializationError> {
        let config = config_service.load_typed()?;
        Self::from_config(config).map(Arc::new)
    }

    pub fn from_config(config: AppConfig) -> Result<Self, InitializationError> {
        let client = reqwest::Client::builder()
            .timeout(config.http.request_timeout())
            .build()
            .map_err(InitializationError::HttpClient)?;

        let embedder = embedding::build_provider(&config, client.clone());
        let index = vector::build_index(&config, client.clone());
        let generator = llm::build_provider(&config, client);

        tracing::info!(
            embedding = embedder.name(),
            dimension = embedder.dimension(),
            index = index.name(),
            generation = generator.name(),
            "Providers configured"
        );

        Ok(Self::from_parts(
            config,
            embedder,
            index,
            generator,
            Arc::new(LopdfExtractor),
        ))
    }

    pub fn from_parts(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn GenerationProvider>,
        extractor: Arc<dyn PageExtractor>,
    ) -> Self {
        let query = QueryPipeline::from_config(
            &config,
            embedder.clone(),
            index.clone(),
            generator.clone(),
        );
        let ingestion = IngestionPipeline::from_config(&config, embedder.clone(), index.clone());

        Self {
            config: Arc::new(config),
            embedder,
            index,
            generator,
            extractor,
            query,
            ingestion,
        }
    }

    /// The index shape the active embedding provider needs.
    pub fn index_spec(&self) -> IndexSpec {
        IndexSpec::cosine(
            &self.config.index.name,
            self.embedder.dimension(),
            &self.config.index.cloud,
            &self.config.index.region,
        )
    }

    /// The in-process index starts out empty, so it is always created at
    /// startup. A hosted index is only touched when explicitly enabled.
    pub fn prepares_index_on_startup(&self) -> bool {
        self.config.index.ensure_on_startup
            || self.config.index.provider == IndexProviderKind::Memory
    }

    /// Creates the index, or recreates it on a dimension mismatch, and
    /// waits until it is ready.
    pub async fn prepare_index(&self) -> Result<IndexDescription, InitializationError> {
        let ingest = &self.config.ingest;
        ensure_index(
            self.index.as_ref(),
            &self.index_spec(),
            Duration::from_millis(ingest.ready_poll_ms),
            Duration::from_secs(ingest.ready_timeout_secs),
        )
        .await
        .map_err(InitializationError::Index)
    }

    /// Batch ingestion of a corpus file. The corpus is read before the index
    /// is prepared, so a bad path never reaches the destructive recreate.
    pub async fn ingest_corpus_file(
        &self,
        path: &Path,
        split: SplitMode,
    ) -> Result<(IndexDescription, IngestReport), InitializationError> {
        let units = load_corpus(path, split)
            .await
            .map_err(InitializationError::Corpus)?;
        if units.is_empty() {
            return Err(InitializationError::Corpus(RagError::Corpus {
                path: path.display().to_string(),
                message: "no text to ingest".to_string(),
            }));
        }
        tracing::info!(path = %path.display(), units = units.len(), "Loaded corpus");

        let index = self.prepare_index().await?;
        tracing::info!(
            index = %index.name,
            dimension = index.dimension,
            "Vector index ready"
        );

        let report = self.ingestion.ingest_corpus(&units).await;
        Ok((index, report))
    }
}
