use async_trait::async_trait;

use crate::core::errors::ProviderError;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// return the provider name (e.g. "gemini", "openai_compat")
    fn name(&self) -> &str;

    /// length of every vector this provider produces
    fn dimension(&self) -> usize;

    /// embed a single search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// embed document chunks, one vector per input in input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Checks a provider response against the request before it reaches the index.
pub(crate) fn check_embeddings(
    provider: &'static str,
    expected_count: usize,
    dimension: usize,
    vectors: &[Vec<f32>],
) -> Result<(), ProviderError> {
    if vectors.len() != expected_count {
        return Err(ProviderError::ResponseParse {
            provider,
            message: format!(
                "expected {} embeddings, got {}",
                expected_count,
                vectors.len()
            ),
        });
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(ProviderError::ResponseParse {
            provider,
            message: format!(
                "expected {}-dimensional embeddings, got {}",
                dimension,
                bad.len()
            ),
        });
    }
    Ok(())
}
