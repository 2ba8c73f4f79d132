//! Embedding providers.
//!
//! The active provider decides the vector dimension the index must have:
//! Gemini `text-embedding-004` produces 768 values, a local MiniLM server 384.

pub mod gemini;
pub mod openai_compat;
pub mod provider;

use std::sync::Arc;

pub use gemini::GeminiEmbedder;
pub use openai_compat::OpenAiCompatEmbedder;
pub use provider::EmbeddingProvider;

use crate::core::config::{AppConfig, EmbeddingProviderKind};

pub fn build_provider(config: &AppConfig, client: reqwest::Client) -> Arc<dyn EmbeddingProvider> {
    let embedding = &config.embedding;
    match embedding.provider {
        EmbeddingProviderKind::Gemini => Arc::new(GeminiEmbedder::new(
            client,
            config.embedding_api_key(),
            embedding.model.clone(),
            embedding.base_url.clone(),
            embedding.dimension,
        )),
        EmbeddingProviderKind::OpenaiCompat => Arc::new(OpenAiCompatEmbedder::new(
            client,
            embedding.api_key.clone(),
            embedding.model.clone(),
            embedding.base_url.clone(),
            embedding.dimension,
        )),
    }
}
