//! Vector storage for the knowledge index.
//!
//! - `rag_vector` - embedded store with on-disk persistence
//! - `vectorstore::InMemoryVectorStore` - throwaway store for tests

#![allow(missing_docs)]

// Vector store abstraction layer
pub mod vectorstore;

// Provider implementations
pub mod rag_vector;

// Re-exports
pub use rag_vector::RagVectorStore;
#[cfg(test)]
pub use vectorstore::InMemoryVectorStore;
pub use vectorstore::{CollectionStats, VectorStore};
