//! LLM Client abstractions and provider management
//!
//! - **Gemini**: hosted `generateContent` API (default)
//! - **Ollama**: local inference, behind the `ollama` feature

use crate::types::{AppError, Result};
use crate::utils::config::{LlmConfig, LlmProviderKind};
use async_trait::async_trait;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Generic LLM client trait for provider abstraction
///
/// Answers are produced by a single completion call per chat turn, so the
/// trait only needs one-shot generation.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// Google Gemini REST API
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Gemini {
    ///     base_url: "https://generativelanguage.googleapis.com".to_string(),
    ///     model: "gemini-2.5-flash".to_string(),
    ///     api_key: std::env::var("GEMINI_API_KEY").ok(),
    ///     timeout_secs: None,
    /// };
    /// ```
    ///
    /// A missing key does not prevent construction; the first `generate`
    /// call fails instead.
    Gemini {
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    },

    /// Ollama local LLM provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Ollama {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     model: "llama3.2".to_string(),
    /// };
    /// ```
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Build the provider described by the `[llm]` config section.
    pub fn from_config(config: &LlmConfig) -> Self {
        match config.provider {
            LlmProviderKind::Gemini => Provider::Gemini {
                base_url: config.base_url.clone(),
                model: config.model.clone(),
                api_key: config.api_key(),
                timeout_secs: config.timeout_secs,
            },
            LlmProviderKind::Ollama => Provider::Ollama {
                base_url: if config.base_url.contains("googleapis.com") {
                    DEFAULT_OLLAMA_URL.to_string()
                } else {
                    config.base_url.clone()
                },
                model: config.model.clone(),
            },
        }
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's feature is disabled or the HTTP
    /// client cannot be built.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::Gemini {
                base_url,
                model,
                api_key,
                timeout_secs,
            } => Ok(Box::new(super::gemini::GeminiClient::new(
                base_url.clone(),
                model.clone(),
                api_key.clone(),
                *timeout_secs,
            )?)),

            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone()).await?,
            )),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { .. } => Err(AppError::Configuration(
                "Ollama provider requires the `ollama` feature".into(),
            )),
        }
    }
}

/// Wrap a transport-level failure as an LLM error.
pub(crate) fn request_error(provider: &str, err: impl std::fmt::Display) -> AppError {
    AppError::LLM(format!("{} request failed: {}", provider, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_default_config() {
        let provider = Provider::from_config(&LlmConfig::default());
        match provider {
            Provider::Gemini { model, base_url, timeout_secs, .. } => {
                assert_eq!(model, "gemini-2.5-flash");
                assert_eq!(base_url, "https://generativelanguage.googleapis.com");
                assert_eq!(timeout_secs, None);
            }
            other => panic!("expected Gemini, got {:?}", other),
        }
    }

    #[test]
    fn test_ollama_gets_local_url_by_default() {
        let config = LlmConfig {
            provider: LlmProviderKind::Ollama,
            model: "llama3.2".to_string(),
            ..LlmConfig::default()
        };
        match Provider::from_config(&config) {
            Provider::Ollama { base_url, .. } => assert_eq!(base_url, DEFAULT_OLLAMA_URL),
            other => panic!("expected Ollama, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gemini_client_builds_without_key() {
        let provider = Provider::Gemini {
            base_url: "http://localhost:1".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            timeout_secs: Some(5),
        };

        let client = match provider.create_client().await {
            Ok(c) => c,
            Err(e) => panic!("client should build without a key: {}", e),
        };
        assert_eq!(client.model_name(), "gemini-2.5-flash");
    }
}
