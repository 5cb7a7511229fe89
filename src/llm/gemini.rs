use crate::llm::client::{request_error, LLMClient};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Header carrying the Gemini API key. Keeping the key out of the query
/// string keeps it out of transport error messages.
pub(crate) const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::LLM("Gemini API key is not set (export GEMINI_API_KEY or add it to .env)".into())
        })?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error("Gemini", e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| request_error("Gemini", e.without_url()))?;

        if !status.is_success() {
            return Err(AppError::LLM(format!("Gemini API error ({}): {}", status, text)));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| AppError::LLM(format!("Invalid Gemini response: {}", e)))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLM("Gemini returned no candidates".into()))?;

        let answer: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if answer.is_empty() {
            return Err(AppError::LLM(format!(
                "Gemini returned no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        debug!(model = %self.model, chars = answer.len(), "Gemini response");
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hi" }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GeminiClient::new(
            "https://example.test/".into(),
            "gemini-2.5-flash".into(),
            None,
            None,
        )
        .unwrap();
        assert_eq!(client.base_url, "https://example.test");
    }

    #[tokio::test]
    async fn test_missing_key_fails_first_call() {
        let client =
            GeminiClient::new("http://localhost:1".into(), "m".into(), None, None).unwrap();
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, AppError::LLM(msg) if msg.contains("API key")));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_key() {
        let client = GeminiClient::new(
            "http://127.0.0.1:1".into(),
            "gemini-2.5-flash".into(),
            Some("SECRET-KEY-123".into()),
            None,
        )
        .unwrap();

        let err = client.generate("hi").await.unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, AppError::LLM(_)));
        assert!(!text.contains("SECRET-KEY-123"), "key leaked: {text}");
    }
}
