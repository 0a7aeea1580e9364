//! LLM integration crate for the PolicyQA assistant.
//!
//! This crate provides a provider-agnostic abstraction for text generation.
//! Providers return either a plain string or a list of typed content blocks;
//! both shapes are carried by [`LlmContent`] and collapse to a single string
//! through [`LlmContent::normalize`].
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Gemini**: Google Generative Language REST API
//!
//! # Example
//! ```no_run
//! use policyqa_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Olá!", "llama3.2").with_temperature(0.0);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content.normalize());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod content;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use content::{ContentBlock, LlmContent};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
