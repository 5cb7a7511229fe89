//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! # Module Structure
//!
//! - [`embeddings`] - text embedding backends
//! - [`index`] - build-once persistent knowledge index
//! - [`retriever`] - top-N lookup per question
//! - [`gate`] - decides whether retrieved text is usable context
//! - [`prompt`] - the two prompt templates
//! - [`pipeline`] - ties the above to an LLM client
//!
//! # Flow
//!
//! 1. **Ingestion** - each loaded document is embedded whole and stored once
//! 2. **Retrieval** - the question is embedded and the top 3 entries fetched
//! 3. **Gating** - joined hit text must exceed 50 trimmed characters
//! 4. **Generation** - augmented or general-knowledge prompt, one call
//!
//! # Example
//!
//! ```ignore
//! use ragchat::rag::{ContextGate, RagPipeline, Retriever};
//!
//! let pipeline = RagPipeline::new(Retriever::new(index, 3), ContextGate::default(), llm);
//! let answer = pipeline.answer("What is our refund policy?").await?;
//! println!("{}", answer.text);
//! ```

pub mod embeddings;
pub mod gate;
pub mod index;
pub mod pipeline;
pub mod prompt;
pub mod retriever;

pub use embeddings::{create_embedder, Embedder, HashedEmbedder};
pub use gate::{ContextDecision, ContextGate, NoContextReason};
pub use index::{IndexManifest, IndexPolicy, IndexStatus, KnowledgeIndex, SetupOutcome};
pub use pipeline::{Answer, RagPipeline};
pub use retriever::Retriever;
