use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{check_embeddings, EmbeddingProvider};
use crate::core::errors::ProviderError;

const PROVIDER: &str = "gemini";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "text-embedding-004";
pub const DEFAULT_DIMENSION: usize = 768;
/// `batchEmbedContents` rejects batches with more requests than this.
pub const MAX_BATCH: usize = 100;

/// Hosted Gemini embeddings. Queries and documents use different task types
/// so the service can optimise each side of the retrieval.
#[derive(Clone)]
pub struct GeminiEmbedder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    client: Client,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

impl GeminiEmbedder {
    pub fn new(
        client: Client,
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
        dimension: Option<usize>,
    ) -> Self {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.trim_start_matches("models/").to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            dimension: dimension.unwrap_or(DEFAULT_DIMENSION),
            client,
        }
    }

    fn request_for(&self, text: &str, task_type: &str) -> Value {
        let mut request = json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] },
            "taskType": task_type,
        });
        if self.dimension != DEFAULT_DIMENSION {
            request["outputDimensionality"] = json!(self.dimension);
        }
        request
    }

    async fn post(&self, method: &str, body: &Value) -> Result<reqwest::Response, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials { provider: PROVIDER })?;
        let url = format!("{}/models/{}:{}", self.base_url, self.model, method);

        tracing::debug!(model = self.model.as_str(), method, "Sending Gemini embedding request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(PROVIDER, status, text));
        }
        Ok(response)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let body = self.request_for(text, "RETRIEVAL_QUERY");
        let payload: EmbedContentResponse = self
            .post("embedContent", &body)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;

        let vector = payload.embedding.values;
        check_embeddings(PROVIDER, 1, self.dimension, std::slice::from_ref(&vector))?;
        Ok(vector)
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            let requests: Vec<Value> = chunk
                .iter()
                .map(|text| self.request_for(text, "RETRIEVAL_DOCUMENT"))
                .collect();
            let payload: BatchEmbedContentsResponse = self
                .post("batchEmbedContents", &json!({ "requests": requests }))
                .await?
                .json()
                .await
                .map_err(|e| ProviderError::parse(PROVIDER, e))?;

            let batch: Vec<Vec<f32>> = payload.embeddings.into_iter().map(|e| e.values).collect();
            check_embeddings(PROVIDER, chunk.len(), self.dimension, &batch)?;
            vectors.extend(batch);
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Answers a batch with `[n, 0.0]` for each text `doc-n`, and refuses
    /// batches larger than the service allows.
    struct BatchResponder;

    impl Respond for BatchResponder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            let requests = body["requests"].as_array().unwrap();
            if requests.len() > MAX_BATCH {
                return ResponseTemplate::new(400).set_body_string(format!(
                    "at most {} requests can be in one batch (got {})",
                    MAX_BATCH,
                    requests.len()
                ));
            }
            let embeddings: Vec<Value> = requests
                .iter()
                .map(|r| {
                    let text = r["content"]["parts"][0]["text"].as_str().unwrap();
                    let n: f32 = text.trim_start_matches("doc-").parse().unwrap();
                    json!({ "values": [n, 0.0] })
                })
                .collect();
            ResponseTemplate::new(200).set_body_json(json!({ "embeddings": embeddings }))
        }
    }

    fn embedder(server: &MockServer, dimension: Option<usize>) -> GeminiEmbedder {
        GeminiEmbedder::new(
            Client::new(),
            Some("g-key".to_string()),
            Some("models/text-embedding-004".to_string()),
            Some(server.uri()),
            dimension,
        )
    }

    #[tokio::test]
    async fn embeds_query_with_retrieval_task_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_partial_json(json!({ "taskType": "RETRIEVAL_QUERY" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embedding": { "values": [0.5, 0.5, 0.0, 0.0] }
            })))
            .mount(&server)
            .await;

        let vector = embedder(&server, Some(4))
            .embed_query("What is atrial fibrillation?")
            .await
            .unwrap();
        assert_eq!(vector, vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn batch_embeds_documents_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:batchEmbedContents"))
            .and(body_partial_json(json!({
                "requests": [
                    { "taskType": "RETRIEVAL_DOCUMENT", "content": { "parts": [{ "text": "one" }] } },
                    { "taskType": "RETRIEVAL_DOCUMENT", "content": { "parts": [{ "text": "two" }] } }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [ { "values": [1.0, 0.0] }, { "values": [0.0, 1.0] } ]
            })))
            .mount(&server)
            .await;

        let vectors = embedder(&server, Some(2))
            .embed_documents(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn large_inputs_are_split_into_service_sized_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:batchEmbedContents"))
            .respond_with(BatchResponder)
            .mount(&server)
            .await;
        let texts: Vec<String> = (0..150).map(|i| format!("doc-{}", i)).collect();

        let vectors = embedder(&server, Some(2)).embed_documents(&texts).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(vectors.len(), 150);
        for (i, vector) in vectors.iter().enumerate() {
            assert_eq!(vector, &vec![i as f32, 0.0]);
        }
    }

    #[tokio::test]
    async fn wrong_dimension_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embedding": { "values": [0.1, 0.2, 0.3] }
            })))
            .mount(&server)
            .await;

        let err = embedder(&server, None).embed_query("q").await.unwrap_err();
        assert!(matches!(err, ProviderError::ResponseParse { .. }));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let err = embedder(&server, Some(2))
            .embed_documents(&["x".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));
        assert!(err.is_transient());
    }
}
