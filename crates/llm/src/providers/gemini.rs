//! Gemini provider implementation.
//!
//! Talks to the Generative Language REST API (`models/{model}:generateContent`).
//! Candidate parts come back as a list, so responses are always surfaced as
//! typed blocks: plain text, function calls, inline data and thought summaries.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::content::{ContentBlock, LlmContent};
use policyqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default Generative Language API endpoint.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
    #[serde(default)]
    function_call: Option<serde_json::Value>,
    #[serde(default)]
    inline_data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl ResponsePart {
    /// Map a raw part onto a typed block.
    fn into_block(self) -> ContentBlock {
        if self.thought.unwrap_or(false) {
            ContentBlock::new("thinking", self.text)
        } else if self.function_call.is_some() {
            ContentBlock::new("function_call", None)
        } else if self.inline_data.is_some() {
            ContentBlock::new("inline_data", None)
        } else if let Some(text) = self.text {
            ContentBlock::text(text)
        } else {
            ContentBlock::new("unknown", None)
        }
    }
}

/// Gemini LLM client.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_GEMINI_URL, api_key)
    }

    /// Create a client against a custom endpoint (proxies, regional gateways).
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_gemini_request(&self, request: &LlmRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction: request.system.as_ref().map(|system| RequestContent {
                role: None,
                parts: vec![RequestPart {
                    text: system.clone(),
                }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }

    fn convert_response(&self, response: GenerateContentResponse, model: &str) -> LlmResponse {
        // Only the first candidate is used; a blocked prompt yields no candidates at all.
        let blocks: Vec<ContentBlock> = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(ResponsePart::into_block)
                    .collect()
            })
            .unwrap_or_default();

        let usage = response
            .usage_metadata
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        LlmResponse {
            content: LlmContent::Blocks(blocks),
            model: response.model_version.unwrap_or_else(|| model.to_string()),
            usage,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    #[tracing::instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending generateContent request to Gemini");

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );

        let mut builder = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.to_gemini_request(request));
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::GenerationTimeout {
                    seconds: request.timeout.map(|t| t.as_secs()).unwrap_or_default(),
                }
            } else {
                AppError::Generation(format!("Failed to send request to Gemini: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse Gemini response: {}", e)))?;

        tracing::info!("Received completion from Gemini");

        Ok(self.convert_response(body, &request.model))
    }
}
