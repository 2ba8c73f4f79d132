use thiserror::Error;

use crate::core::errors::ConfigError;
use crate::rag::RagError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to load corpus: {0}")]
    Corpus(#[source] RagError),

    #[error("Failed to prepare vector index: {0}")]
    Index(#[source] RagError),
}
