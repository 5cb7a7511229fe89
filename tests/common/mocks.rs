//! Mock LLM clients shared by the integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use ragchat::llm::LLMClient;
use ragchat::types::{AppError, Result};
use std::sync::Arc;

/// Mock LLM client with a canned reply that records every prompt it sees.
///
/// ```ignore
/// let client = MockLLMClient::new("Hello!");
/// // ... run a turn ...
/// assert_eq!(client.prompts().len(), 1);
/// ```
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLLMClient {
    /// Create a mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock client that always returns an LLM error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// The most recent prompt.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
