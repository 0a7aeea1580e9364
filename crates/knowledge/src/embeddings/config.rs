//! Embedding configuration types.

use policyqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding provider settings (`embedding` section of `rag.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    /// Provider name: "ollama" or "trigram"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier (provider-specific)
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding vector dimensions
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Provider endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Maximum number of texts per embedding call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "all-minilm".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dimensions: default_dimensions(),
            endpoint: None,
            batch_size: default_batch_size(),
        }
    }
}

impl EmbeddingConfig {
    /// Offline configuration backed by the trigram embedder.
    pub fn trigram() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than 0".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.batchSize must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
