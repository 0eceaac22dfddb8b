//! Text generation capability and its OpenAI-compatible chat client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::GenerationError;
use crate::models::GenerationConfig;

/// Sampling settings for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Produces answer text from a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any server implementing the OpenAI chat completions API.
#[derive(Debug, Clone)]
pub struct ChatGenerator {
    client: Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
    api_key: Option<String>,
}

impl ChatGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            api_key: config.api_key.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    async fn generate(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };
        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            temperature = params.temperature,
            max_tokens = params.max_tokens,
            "requesting completion"
        );

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                GenerationError::ConnectionError(e.to_string())
            } else {
                GenerationError::ServerError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::InvalidResponse("response has no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_config() {
        let params = GenerationParams::from(&GenerationConfig::default());
        assert_eq!(params.max_tokens, 1024);
        assert!(params.temperature < 0.2);
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "prompt",
            }],
            temperature: 0.1,
            max_tokens: 64,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "prompt");
        assert_eq!(json["max_tokens"], 64);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"The cat sat."},"finish_reason":"stop"}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("The cat sat.")
        );
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = GenerationConfig {
            url: "http://localhost:8000/v1/".to_string(),
            ..Default::default()
        };
        let client = ChatGenerator::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000/v1");
    }
}
