//! Embedded vector store backed by `ragchat-vector`.
//!
//! Entry text is stored as the record document and the source file name
//! as the `source` metadata key, so a persisted collection is
//! self-contained: reopening the store restores everything a query needs.
//!
//! ```rust,ignore
//! let store = RagVectorStore::new(Some("./chroma_db".into())).await?;
//! store.create_collection("knowledge_base", 384).await?;
//! store.add("knowledge_base", &entries, &embeddings).await?;
//! let hits = store.query("knowledge_base", &embedding, 3).await?;
//! ```

use crate::types::{AppError, IndexEntry, IndexHit, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use super::vectorstore::{check_batch, CollectionStats, VectorStore};
use ragchat_vector::{Config, DistanceMetric, Record, VectorDb, VectorMetadata};

const SOURCE_KEY: &str = "source";

/// Vector store over an embedded [`VectorDb`].
pub struct RagVectorStore {
    /// The underlying database (VectorDb is Clone and uses Arc internally)
    db: VectorDb,
}

impl RagVectorStore {
    /// Open the store at `path`, loading any persisted collections.
    ///
    /// # Errors
    ///
    /// Returns a database error if persisted collections exist but cannot
    /// be read back.
    pub async fn new(path: Option<PathBuf>) -> Result<Self> {
        let config = match path {
            Some(p) => Config::persistent(p),
            None => Config::memory(),
        };

        let db = VectorDb::open(config)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open vector store: {}", e)))?;

        Ok(Self { db })
    }
}

#[async_trait]
impl VectorStore for RagVectorStore {
    fn provider_name(&self) -> &'static str {
        "ragchat-vector"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        if self.db.collection_exists(name) {
            return Err(AppError::InvalidInput(format!(
                "Collection '{}' already exists",
                name
            )));
        }

        self.db
            .create_collection(name, dimensions, DistanceMetric::Cosine)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create collection: {}", e)))
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        if !self.db.collection_exists(name) {
            return Err(AppError::NotFound(format!("Collection '{}' not found", name)));
        }

        self.db
            .delete_collection(name)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete collection: {}", e)))
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.db.collection_exists(name))
    }

    async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        let collection = self
            .db
            .get_collection(name)
            .map_err(|_| AppError::NotFound(format!("Collection '{}' not found", name)))?;

        let stats = collection.stats();

        Ok(CollectionStats {
            name: stats.name,
            document_count: stats.count,
            dimensions: stats.dimensions,
            distance_metric: stats.metric.name().to_string(),
        })
    }

    async fn add(
        &self,
        collection: &str,
        entries: &[IndexEntry],
        embeddings: &[Vec<f32>],
    ) -> Result<usize> {
        check_batch(entries, embeddings)?;
        if entries.is_empty() {
            return Ok(0);
        }

        if !self.db.collection_exists(collection) {
            return Err(AppError::NotFound(format!(
                "Collection '{}' not found",
                collection
            )));
        }

        let records: Vec<Record> = entries
            .iter()
            .zip(embeddings)
            .map(|(entry, embedding)| {
                Record::new(entry.id.clone(), embedding.clone())
                    .with_document(entry.text.clone())
                    .with_metadata(VectorMetadata::from_pairs([(
                        SOURCE_KEY,
                        entry.source.as_str(),
                    )]))
            })
            .collect();

        Ok(self.db.insert_batch(collection, records).await?)
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<IndexHit>> {
        if !self.db.collection_exists(collection) {
            return Err(AppError::NotFound(format!(
                "Collection '{}' not found",
                collection
            )));
        }

        let results = self.db.search(collection, embedding, limit)?;

        Ok(results
            .into_iter()
            .map(|r| IndexHit {
                source: r.metadata.get(SOURCE_KEY).unwrap_or_default().to_string(),
                text: r.document.unwrap_or_default(),
                id: r.id,
                score: r.score,
            })
            .collect())
    }
}
