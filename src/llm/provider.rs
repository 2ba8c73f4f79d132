use async_trait::async_trait;

use crate::core::errors::ProviderError;

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// return the provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// single-turn, non-streaming completion of a fully assembled prompt
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}
