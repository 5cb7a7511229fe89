//! Vector Store Abstraction Layer
//!
//! The knowledge index talks to its storage through the [`VectorStore`]
//! trait:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  VectorStore Trait                    │
//! ├──────────────────────────────────────────────────────┤
//! │ create_collection │ add │ query │ count │ delete ... │
//! └──────────────────────────────────────────────────────┘
//!            ▲                          ▲
//!     ┌──────┴──────┐           ┌───────┴───────┐
//!     │  RagVector  │           │   InMemory    │
//!     │ (persistent)│           │  (unit tests) │
//!     └─────────────┘           └───────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ragchat::db::{RagVectorStore, VectorStore};
//!
//! let store = RagVectorStore::new(Some("./chroma_db".into())).await?;
//!
//! store.create_collection("knowledge_base", 384).await?;
//! store.add("knowledge_base", &entries, &embeddings).await?;
//! let hits = store.query("knowledge_base", &query_embedding, 3).await?;
//! ```

use crate::types::{AppError, IndexEntry, IndexHit, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Collection Statistics
// ============================================================================

/// Statistics about a vector collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Name of the collection.
    pub name: String,
    /// Number of entries in the collection.
    pub document_count: usize,
    /// Dimensionality of vectors in the collection.
    pub dimensions: usize,
    /// Distance metric used (e.g., "cosine").
    pub distance_metric: String,
}

// ============================================================================
// Vector Store Trait
// ============================================================================

/// Abstract trait for vector database operations.
///
/// # Implementors
///
/// - `RagVectorStore` - embedded, optionally persistent
/// - `InMemoryVectorStore` - unit tests only
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this vector store provider.
    fn provider_name(&self) -> &'static str;

    /// Create a new collection with the specified vector dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a collection and all its data.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the collection doesn't exist.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Check if a collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Get statistics about a collection.
    async fn collection_stats(&self, name: &str) -> Result<CollectionStats>;

    /// Add entries with their embeddings to a collection.
    ///
    /// `entries[i]` is stored with `embeddings[i]`. Ids must be new to the
    /// collection; the whole batch is rejected otherwise.
    ///
    /// # Returns
    ///
    /// Number of entries added.
    async fn add(
        &self,
        collection: &str,
        entries: &[IndexEntry],
        embeddings: &[Vec<f32>],
    ) -> Result<usize>;

    /// Find the `limit` entries nearest to `embedding`, best first.
    async fn query(&self, collection: &str, embedding: &[f32], limit: usize)
        -> Result<Vec<IndexHit>>;

    /// Count entries in a collection.
    async fn count(&self, collection: &str) -> Result<usize> {
        let stats = self.collection_stats(collection).await?;
        Ok(stats.document_count)
    }
}

/// Check that a batch pairs every entry with exactly one embedding.
pub(crate) fn check_batch(entries: &[IndexEntry], embeddings: &[Vec<f32>]) -> Result<()> {
    if entries.len() != embeddings.len() {
        return Err(AppError::InvalidInput(format!(
            "Got {} entries but {} embeddings",
            entries.len(),
            embeddings.len()
        )));
    }
    Ok(())
}

// ============================================================================
// In-Memory Vector Store (unit tests)
// ============================================================================

#[cfg(test)]
use parking_lot::RwLock;
#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::Arc;

/// In-memory vector store for testing purposes.
///
/// Uses cosine similarity. Entries keep insertion order so equal scores
/// rank the earlier entry first.
#[cfg(test)]
pub struct InMemoryVectorStore {
    collections: Arc<RwLock<HashMap<String, InMemoryCollection>>>,
}

#[cfg(test)]
struct InMemoryCollection {
    dimensions: usize,
    entries: Vec<(IndexEntry, Vec<f32>)>,
}

#[cfg(test)]
impl InMemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Calculate cosine similarity between two vectors.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

#[cfg(test)]
impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(AppError::InvalidInput(format!(
                "Collection '{}' already exists",
                name
            )));
        }
        collections.insert(
            name.to_string(),
            InMemoryCollection {
                dimensions,
                entries: Vec::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write();
        collections
            .remove(name)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", name)))?;
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let collections = self.collections.read();
        Ok(collections.contains_key(name))
    }

    async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        let collections = self.collections.read();
        let col = collections
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", name)))?;

        Ok(CollectionStats {
            name: name.to_string(),
            document_count: col.entries.len(),
            dimensions: col.dimensions,
            distance_metric: "cosine".to_string(),
        })
    }

    async fn add(
        &self,
        collection: &str,
        entries: &[IndexEntry],
        embeddings: &[Vec<f32>],
    ) -> Result<usize> {
        check_batch(entries, embeddings)?;

        let mut collections = self.collections.write();
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", collection)))?;

        for (entry, embedding) in entries.iter().zip(embeddings) {
            if embedding.len() != col.dimensions {
                return Err(AppError::InvalidInput(format!(
                    "Entry '{}' has {} dimensions, expected {}",
                    entry.id,
                    embedding.len(),
                    col.dimensions
                )));
            }
            if col.entries.iter().any(|(e, _)| e.id == entry.id) {
                return Err(AppError::InvalidInput(format!(
                    "Entry '{}' already exists",
                    entry.id
                )));
            }
        }

        col.entries.extend(
            entries
                .iter()
                .cloned()
                .zip(embeddings.iter().cloned()),
        );

        Ok(entries.len())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<IndexHit>> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", collection)))?;

        let mut results: Vec<IndexHit> = col
            .entries
            .iter()
            .map(|(entry, vector)| IndexHit {
                id: entry.id.clone(),
                text: entry.text.clone(),
                source: entry.source.clone(),
                score: Self::cosine_similarity(embedding, vector),
            })
            .collect();

        // Stable sort keeps insertion order among ties
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }
}

// ============================================================================
// Tests
// ============================================================================
