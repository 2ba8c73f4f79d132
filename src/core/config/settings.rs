//! Typed view of the merged configuration document.
//!
//! Every section has defaults so an empty `config.yml` yields a runnable
//! setup (Gemini embeddings + generation, Pinecone index).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rag::retry::RetryPolicy;

pub const DEFAULT_INDEX_NAME: &str = "medical-chatbot-local";
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub prompt: PromptConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    Gemini,
    OpenaiCompat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    /// Falls back to the provider's default model when unset.
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Overrides the provider's native dimension.
    pub dimension: Option<usize>,
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Gemini,
            model: None,
            base_url: None,
            dimension: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            base_url: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexProviderKind {
    Pinecone,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub provider: IndexProviderKind,
    pub name: String,
    pub cloud: String,
    pub region: String,
    pub api_key: Option<String>,
    pub controller_url: Option<String>,
    pub namespace: Option<String>,
    /// Run the dimension check (and destructive recreate) when the server starts.
    pub ensure_on_startup: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: IndexProviderKind::Pinecone,
            name: DEFAULT_INDEX_NAME.to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            api_key: None,
            controller_url: None,
            namespace: None,
            ensure_on_startup: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplateKind {
    Cardiologist,
    Educational,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub template: PromptTemplateKind,
    /// Must contain `{context}` and `{question}`; wins over `template`.
    pub custom_template: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: PromptTemplateKind::Educational,
            custom_template: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    Whole,
    Paragraph,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub corpus_path: String,
    pub split: SplitMode,
    pub batch_size: usize,
    /// Minimum spacing between batch starts.
    pub batch_interval_ms: u64,
    pub ready_poll_ms: u64,
    pub ready_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            corpus_path: "data/medical_data.txt".to_string(),
            split: SplitMode::Whole,
            batch_size: 10,
            batch_interval_ms: 2_000,
            ready_poll_ms: 1_000,
            ready_timeout_secs: 300,
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Key used for Gemini embeddings: the embedding key, else the generation key.
    pub fn embedding_api_key(&self) -> Option<String> {
        self.embedding
            .api_key
            .clone()
            .or_else(|| match self.embedding.provider {
                EmbeddingProviderKind::Gemini => self.generation.api_key.clone(),
                EmbeddingProviderKind::OpenaiCompat => None,
            })
    }

    /// Credentials the ingestion path cannot run without.
    pub fn missing_ingest_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.index.provider == IndexProviderKind::Pinecone && is_blank(&self.index.api_key) {
            missing.push("PINECONE_API_KEY");
        }
        if self.embedding.provider == EmbeddingProviderKind::Gemini
            && is_blank(&self.embedding_api_key())
        {
            missing.push("GOOGLE_API_KEY");
        }
        missing
    }

    /// Credentials the chat path needs in addition to the ingestion ones.
    pub fn missing_server_keys(&self) -> Vec<&'static str> {
        let mut missing = self.missing_ingest_keys();
        if is_blank(&self.generation.api_key) && !missing.contains(&"GOOGLE_API_KEY") {
            missing.push("GOOGLE_API_KEY");
        }
        missing
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_yields_defaults() {
        let config: AppConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.index.name, DEFAULT_INDEX_NAME);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.ingest.batch_size, 10);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Gemini);
        assert_eq!(config.prompt.template, PromptTemplateKind::Educational);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: AppConfig = serde_json::from_value(json!({
            "embedding": { "provider": "openai_compat", "dimension": 384 },
            "ingest": { "split": "paragraph" }
        }))
        .unwrap();
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenaiCompat);
        assert_eq!(config.embedding.dimension, Some(384));
        assert_eq!(config.ingest.split, SplitMode::Paragraph);
        assert_eq!(config.ingest.batch_interval_ms, 2_000);
    }

    #[test]
    fn gemini_embeddings_share_the_generation_key() {
        let mut config = AppConfig::default();
        config.generation.api_key = Some("g-key".to_string());
        assert_eq!(config.embedding_api_key().as_deref(), Some("g-key"));

        config.embedding.provider = EmbeddingProviderKind::OpenaiCompat;
        assert_eq!(config.embedding_api_key(), None);
    }

    #[test]
    fn missing_keys_are_reported_once() {
        let config = AppConfig::default();
        assert_eq!(
            config.missing_server_keys(),
            vec!["PINECONE_API_KEY", "GOOGLE_API_KEY"]
        );

        let mut local = AppConfig::default();
        local.index.provider = IndexProviderKind::Memory;
        local.embedding.provider = EmbeddingProviderKind::OpenaiCompat;
        assert!(local.missing_ingest_keys().is_empty());
        assert_eq!(local.missing_server_keys(), vec!["GOOGLE_API_KEY"]);
    }
}
