use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::GenerationProvider;
use crate::core::errors::ProviderError;

const PROVIDER: &str = "gemini";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiGenerator {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl GeminiGenerator {
    pub fn new(client: Client, api_key: Option<String>, model: String, base_url: Option<String>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.trim_start_matches("models/").to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        }
    }

    /// Concatenates the text parts of the first candidate.
    fn parse_response(body: &Value) -> Result<String, ProviderError> {
        let candidate = body["candidates"]
            .as_array()
            .and_then(|candidates| candidates.first())
            .ok_or_else(|| {
                let reason = body["promptFeedback"]["blockReason"]
                    .as_str()
                    .map(|r| format!("prompt blocked: {}", r))
                    .unwrap_or_else(|| "missing 'candidates' in response".to_string());
                ProviderError::ResponseParse {
                    provider: PROVIDER,
                    message: reason,
                }
            })?;

        let parts = candidate["content"]["parts"]
            .as_array()
            .ok_or_else(|| ProviderError::ResponseParse {
                provider: PROVIDER,
                message: format!(
                    "candidate has no content (finishReason: {})",
                    candidate["finishReason"].as_str().unwrap_or("unknown")
                ),
            })?;

        Ok(parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect::<Vec<_>>()
            .concat())
    }
}

#[async_trait]
impl GenerationProvider for GeminiGenerator {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials { provider: PROVIDER })?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        tracing::debug!(
            model = self.model.as_str(),
            prompt_chars = prompt.len(),
            "Sending Gemini completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, e))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;

        if !status.is_success() {
            return Err(ProviderError::from_status(PROVIDER, status, body_text));
        }

        let payload: Value =
            serde_json::from_str(&body_text).map_err(|e| ProviderError::parse(PROVIDER, e))?;
        Self::parse_response(&payload)
    }
}
