//! Ollama embedding provider.
//!
//! Calls the local `/api/embeddings` endpoint, one request per text. The
//! default model is `all-minilm` (all-MiniLM-L6-v2, 384 dimensions).

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use policyqa_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embedding provider using the local API.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider. No request is made until the first embedding.
    ///
    /// The endpoint comes from the config, then `OLLAMA_URL`, then the local default.
    pub fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Embedding(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let base_url = config
            .endpoint
            .clone()
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);

        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| {
                AppError::Embedding(format!(
                    "Ollama not reachable at {} ({}). Ensure it is running and run: ollama pull {}",
                    self.base_url, e, self.model
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);

            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        if body.embedding.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Ollama model '{}' returned {} dimensions, expected {}",
                self.model,
                body.embedding.len(),
                self.dimensions
            )));
        }

        Ok(body.embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama"))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        debug!("Embedding batch of {} texts", texts.len());

        // The endpoint takes one prompt per request.
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_single(text).await?);
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_config() {
        let config = EmbeddingConfig {
            endpoint: Some("http://ollama:11434/".to_string()),
            ..EmbeddingConfig::default()
        };
        let provider = OllamaProvider::new(&config).unwrap();

        assert_eq!(provider.base_url, "http://ollama:11434");
        assert_eq!(provider.model_name(), "all-minilm");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_request_body() {
        let json = serde_json::to_value(EmbeddingRequest {
            model: "all-minilm",
            prompt: "senha",
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"model": "all-minilm", "prompt": "senha"}));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_embedding_error() {
        let config = EmbeddingConfig {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            ..EmbeddingConfig::default()
        };
        let provider = OllamaProvider::new(&config).unwrap();

        match provider.embed("vpn").await {
            Err(AppError::Embedding(msg)) => assert!(msg.contains("not reachable")),
            other => panic!("expected embedding error, got {:?}", other),
        }
    }
}
