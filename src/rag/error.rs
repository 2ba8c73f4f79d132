use thiserror::Error;

use crate::core::errors::ProviderError;

/// Typed outcome of the retrieval and ingestion pipelines. The HTTP layer
/// decides how each variant is shown to a client.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("embedding failed: {0}")]
    Embedding(#[source] ProviderError),

    #[error("vector index error: {0}")]
    Index(#[source] ProviderError),

    #[error("generation failed: {0}")]
    Generation(#[source] ProviderError),

    #[error("could not read document: {0}")]
    Extraction(String),

    #[error("failed to read corpus {path}: {message}")]
    Corpus { path: String, message: String },

    #[error("index '{name}' was not ready after {waited_secs}s")]
    IndexNotReady { name: String, waited_secs: u64 },
}

impl RagError {
    /// Short machine-readable label, surfaced next to the rendered message.
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::EmptyQuestion => "invalid_question",
            RagError::Embedding(_) => "embedding",
            RagError::Index(_) => "retrieval",
            RagError::Generation(_) => "generation",
            RagError::Extraction(_) => "extraction",
            RagError::Corpus { .. } => "corpus",
            RagError::IndexNotReady { .. } => "index_not_ready",
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            RagError::Embedding(e) | RagError::Index(e) | RagError::Generation(e) => {
                e.is_transient()
            }
            _ => false,
        }
    }
}
