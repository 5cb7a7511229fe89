//! LLM Provider Clients
//!
//! Answers come from a hosted model behind the [`LLMClient`] trait. The
//! provider is picked at runtime from the `[llm]` config section via
//! [`Provider::from_config`].
//!
//! # Supported Providers
//!
//! - Gemini (`generateContent` REST API), always available
//! - Ollama, behind the `ollama` feature (on by default)
//!
//! # Example
//!
//! ```ignore
//! use ragchat::llm::Provider;
//!
//! let client = Provider::from_config(&config.llm).create_client().await?;
//! let answer = client.generate("What is 2+2?").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
pub mod gemini;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{LLMClient, Provider};
pub use gemini::GeminiClient;
