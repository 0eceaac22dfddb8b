//! Embedding capability and its OpenAI-compatible HTTP client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;
use crate::utils::{CallGuard, RetryConfig, with_retry};

/// Turns text into a fixed-dimension vector.
///
/// Ingestion and querying must use the same embedder: vectors from
/// different models or dimensions are not comparable.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;
}

/// Embed `text` under `guard` with retries, then check the vector length
/// against `dimension`.
pub async fn embed_checked(
    embedder: &dyn Embedder,
    text: &str,
    dimension: usize,
    guard: &CallGuard,
    retry: &RetryConfig,
) -> Result<Vec<f32>, EmbeddingError> {
    let vector = with_retry(retry, guard.cancel_token(), "embed", || {
        guard.run(embedder.embed(text))
    })
    .await?;

    if vector.len() != dimension {
        return Err(EmbeddingError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }
    Ok(vector)
}

/// Request body for the `/embeddings` endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for any server implementing the OpenAI embeddings API.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
    timeout_secs: u64,
    api_key: Option<String>,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension as usize,
            timeout_secs: config.timeout_secs,
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: vec![text],
        };
        debug!(model = %self.model, text_len = text.len(), "requesting embedding");

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                EmbeddingError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                EmbeddingError::ConnectionError(e.to_string())
            } else {
                EmbeddingError::ServerError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OpenAiEmbedder::new(&EmbeddingConfig::default()).unwrap();
        assert_eq!(client.dimension(), 1536);
        assert_eq!(client.model(), "text-embedding-3-small");
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            url: "http://localhost:11411/v1/".to_string(),
            ..Default::default()
        };
        let client = OpenAiEmbedder::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11411/v1");
    }

    #[test]
    fn test_request_shape() {
        let request = EmbedRequest {
            model: "m",
            input: vec!["hello"],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["input"][0], "hello");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,0.2]}],"model":"m"}"#;
        let parsed: EmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, 0.2]);
    }
}
