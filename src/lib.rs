//! # ragchat
//!
//! Chat with the documents in a local folder. PDF, text, Word and Excel
//! files are read once into a persistent vector index; every question
//! retrieves the closest documents and, when they carry enough text, hands
//! them to a hosted LLM as context. Otherwise the model answers from its
//! general knowledge.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use ragchat::{app, rag::IndexPolicy, RagChatConfig};
//!
//! #[tokio::main]
//! async fn main() -> ragchat::Result<()> {
//!     let config = RagChatConfig::load("ragchat.toml")?;
//!     let (state, _) = app::bootstrap(config, IndexPolicy::Reuse).await?;
//!
//!     let id = state.sessions.create();
//!     let session = state.sessions.get(&id)?;
//!     let answer = session.lock().await.turn(&state.pipeline, "What is in the handbook?").await?;
//!     println!("{}", answer.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `local-embeddings` | fastembed ONNX embeddings |
//!
//! ## Modules
//!
//! - [`loader`] - knowledge folder reading
//! - [`db`] - vector store abstraction
//! - [`rag`] - index, retrieval, context gate, prompts
//! - [`llm`] - LLM client implementations
//! - [`chat`] - chat sessions
//! - [`api`] - REST API and embedded UI
//! - [`types`] - common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers, routes and the embedded chat page.
pub mod api;
/// Startup wiring.
pub mod app;
/// Chat sessions and their history.
#[allow(missing_docs)]
pub mod chat;
/// Command line interface.
pub mod cli;
/// Vector store abstraction and backends.
pub mod db;
/// LLM provider clients and abstractions.
#[allow(missing_docs)]
pub mod llm;
/// Knowledge folder loading.
#[allow(missing_docs)]
pub mod loader;
/// Retrieval Augmented Generation (RAG) components.
#[allow(missing_docs)]
pub mod rag;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use chat::{ChatSession, SessionStore};
pub use llm::{LLMClient, Provider};
pub use rag::{KnowledgeIndex, RagPipeline};
pub use types::{AppError, Result};
pub use utils::config::RagChatConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<RagChatConfig>,
    /// The populated knowledge index
    pub index: Arc<KnowledgeIndex>,
    /// Retrieval and generation for one turn
    pub pipeline: Arc<RagPipeline>,
    /// Live chat sessions
    pub sessions: Arc<SessionStore>,
}
