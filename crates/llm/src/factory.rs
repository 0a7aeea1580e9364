//! LLM provider factory.
//!
//! Resolves a provider name from configuration into a concrete client.

use crate::client::LlmClient;
use crate::providers::gemini::DEFAULT_GEMINI_URL;
use crate::providers::ollama::DEFAULT_OLLAMA_URL;
use crate::providers::{GeminiClient, OllamaClient};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "gemini")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by hosted providers
///
/// # Errors
/// Returns error if the provider is unknown or a required secret is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        "gemini" | "google" => {
            let key = api_key
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| "Gemini provider requires API key".to_string())?;
            let base_url = endpoint.unwrap_or(DEFAULT_GEMINI_URL);
            Ok(Arc::new(GeminiClient::with_base_url(base_url, key)))
        }
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("Ollama", Some("http://ollama:11434"), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_gemini_requires_api_key() {
        match create_client("gemini", None, None) {
            Err(err) => assert!(err.contains("requires API key")),
            Ok(_) => panic!("Expected error for Gemini without API key"),
        }
        assert!(create_client("gemini", None, Some("  ")).is_err());
    }

    #[test]
    fn test_create_gemini_client() {
        let client = create_client("gemini", None, Some("secret")).unwrap();
        assert_eq!(client.provider_name(), "gemini");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("openai", None, None) {
            Err(err) => assert!(err.contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
