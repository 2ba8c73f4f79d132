use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{check_embeddings, EmbeddingProvider};
use crate::core::errors::ProviderError;

const PROVIDER: &str = "openai_compat";
pub const DEFAULT_BASE_URL: &str = "http://localhost:1234";
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_DIMENSION: usize = 384;

/// Local sentence-embedding server speaking the OpenAI `/v1/embeddings`
/// protocol (LM Studio, text-embeddings-inference, llama.cpp server).
#[derive(Clone)]
pub struct OpenAiCompatEmbedder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    client: Client,
}

impl OpenAiCompatEmbedder {
    pub fn new(
        client: Client,
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
        dimension: Option<usize>,
    ) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            dimension: dimension.unwrap_or(DEFAULT_DIMENSION),
            client,
        }
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(PROVIDER, status, text));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;

        let data = payload["data"]
            .as_array()
            .ok_or_else(|| ProviderError::ResponseParse {
                provider: PROVIDER,
                message: "missing 'data' array".to_string(),
            })?;

        // Servers may return items out of order; `index` is authoritative.
        let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
        for (position, item) in data.iter().enumerate() {
            let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(position);
            let vec: Vec<f32> = item["embedding"]
                .as_array()
                .map(|vals| {
                    vals.iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect()
                })
                .unwrap_or_default();
            indexed.push((index, vec));
        }
        indexed.sort_by_key(|(index, _)| *index);

        let embeddings: Vec<Vec<f32>> = indexed.into_iter().map(|(_, v)| v).collect();
        check_embeddings(PROVIDER, inputs.len(), self.dimension, &embeddings)?;
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatEmbedder {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        Ok(vectors.remove(0))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn reorders_items_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(json!({ "model": "all-MiniLM-L6-v2" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "index": 1, "embedding": [0.0, 1.0] },
                    { "index": 0, "embedding": [1.0, 0.0] }
                ]
            })))
            .mount(&server)
            .await;

        let embedder =
            OpenAiCompatEmbedder::new(Client::new(), None, None, Some(server.uri()), Some(2));
        let vectors = embedder
            .embed_documents(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
            .mount(&server)
            .await;

        let embedder = OpenAiCompatEmbedder::new(Client::new(), None, None, Some(server.uri()), None);
        let err = embedder.embed_query("q").await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(embedder.dimension(), 384);
    }
}
