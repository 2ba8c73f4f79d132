pub mod gemini;
pub mod provider;

use std::sync::Arc;

pub use gemini::GeminiGenerator;
pub use provider::GenerationProvider;

use crate::core::config::AppConfig;

pub fn build_provider(config: &AppConfig, client: reqwest::Client) -> Arc<dyn GenerationProvider> {
    Arc::new(GeminiGenerator::new(
        client,
        config.generation.api_key.clone(),
        config.generation.model.clone(),
        config.generation.base_url.clone(),
    ))
}
