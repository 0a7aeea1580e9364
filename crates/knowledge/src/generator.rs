//! Grounded answer generation.

use crate::context::AssembledContext;
use crate::types::{AnswerResult, NOT_FOUND_ANSWER};
use policyqa_core::{AppError, AppResult};
use policyqa_llm::{LlmClient, LlmRequest};
use policyqa_prompt::{build_grounded_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Generation settings (`generation` section of `rag.yaml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Model override; falls back to the provider's model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Prompt override id under `.policyqa/prompts/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            timeout_secs: default_timeout_secs(),
            temperature: 0.0,
            max_tokens: None,
            prompt_id: None,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "generation.timeoutSecs must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "generation.temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Turns assembled context into a grounded answer through a generative model.
pub struct GroundedGenerator {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    timeout: Duration,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl GroundedGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        model: impl Into<String>,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            client,
            prompt,
            model: model.into(),
            timeout: config.timeout(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer `question` from `context`.
    ///
    /// Empty context short-circuits to the not-found answer without calling
    /// the model. Empty model output becomes the not-found answer but keeps
    /// the citations. Timeouts and provider failures are returned as errors.
    pub async fn generate(
        &self,
        question: &str,
        context: AssembledContext,
    ) -> AppResult<AnswerResult> {
        if context.is_empty() {
            tracing::info!("No context for query, skipping generation");
            return Ok(AnswerResult::not_found());
        }

        let built = build_grounded_prompt(&self.prompt, &context.text, question, NOT_FOUND_ANSWER)?;

        let mut request = LlmRequest::new(built.user, self.model.as_str())
            .with_temperature(self.temperature)
            .with_timeout(self.timeout);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(
            "Generating answer with {} (model: {}, prompt: {})",
            self.client.provider_name(),
            self.model,
            built.metadata.source_prompt_id
        );

        let response = tokio::time::timeout(self.timeout, self.client.complete(&request))
            .await
            .map_err(|_| AppError::GenerationTimeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| match e {
                AppError::GenerationTimeout { .. } | AppError::Generation(_) => e,
                other => AppError::Generation(other.to_string()),
            })?;

        let answer = response.content.normalize();
        let answer = if answer.is_empty() {
            tracing::warn!("Model returned no text, answering with the not-found sentence");
            NOT_FOUND_ANSWER.to_string()
        } else {
            answer
        };

        Ok(AnswerResult {
            answer,
            citations: context.citations,
        })
    }
}
