//! External text generation for free-form chat replies.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when calling a text generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Generator error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Produces a reply to a single user message. No conversation history is kept.
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Ollama's non-streaming `/api/generate` endpoint.
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeneratorError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(url = %url, model = %self.model, "Requesting chat completion");

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout
                } else {
                    GeneratorError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

        let text = body.response.trim();
        if text.is_empty() {
            return Err(GeneratorError::InvalidResponse("empty response".to_string()));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_without_streaming() {
        let body = serde_json::to_value(GenerateRequest {
            model: "llama3",
            prompt: "hello",
            stream: false,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"model": "llama3", "prompt": "hello", "stream": false})
        );
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let generator =
            OllamaGenerator::new("http://localhost:11434/", "llama3", Duration::from_secs(5))
                .unwrap();
        assert_eq!(generator.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    async fn unreachable_generator_errors() {
        let generator =
            OllamaGenerator::new("http://127.0.0.1:9", "llama3", Duration::from_secs(2)).unwrap();
        assert!(matches!(
            generator.generate("hi").await,
            Err(GeneratorError::Connection(_)) | Err(GeneratorError::Timeout)
        ));
    }
}
