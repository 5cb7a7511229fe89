//! # ragchat-vector
//!
//! A small embedded vector database: named collections of
//! `(id, vector, document, metadata)` records with exact similarity search
//! and optional JSON persistence.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragchat_vector::{Config, DistanceMetric, Record, VectorDb};
//!
//! let db = VectorDb::open(Config::persistent("./chroma_db")).await?;
//! db.create_collection("knowledge_base", 384, DistanceMetric::Cosine).await?;
//! db.insert_batch("knowledge_base", vec![Record::new("0", embedding)]).await?;
//! let hits = db.search("knowledge_base", &query, 3)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod distance;
pub mod error;
pub mod persistence;
pub mod types;

pub use collection::{Collection, CollectionStats};
pub use config::Config;
pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use types::{Record, SearchResult, VectorId, VectorMetadata};

use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The main vector database instance.
///
/// `VectorDb` is cheap to clone; clones share the same collections. When
/// opened with a persistent [`Config`], every mutation is written through
/// to disk before the call returns.
#[derive(Clone)]
pub struct VectorDb {
    inner: Arc<VectorDbInner>,
}

struct VectorDbInner {
    config: Config,
    collections: scc::HashMap<String, Arc<Collection>>,
}

impl VectorDb {
    /// Open or create a vector database with the given configuration.
    ///
    /// For a persistent configuration the data directory is created if
    /// missing and every collection found in it is loaded. A collection
    /// that fails to load is an error rather than being skipped.
    #[instrument(skip(config), fields(persistent = config.is_persistent()))]
    pub async fn open(config: Config) -> Result<Self> {
        info!("Opening vector database");

        let db = Self {
            inner: Arc::new(VectorDbInner {
                config: config.clone(),
                collections: scc::HashMap::new(),
            }),
        };

        if let Some(ref path) = config.data_path {
            tokio::fs::create_dir_all(path).await?;
            for name in persistence::list_persisted(path).await? {
                let collection = persistence::load_collection(path, &name).await?;
                let _ = db.inner.collections.insert(name, Arc::new(collection));
            }
        }

        Ok(db)
    }

    /// Create a new collection.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection with the same name already exists.
    #[instrument(skip(self))]
    pub async fn create_collection(
        &self,
        name: &str,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Result<()> {
        info!(name, dimensions, ?metric, "Creating collection");

        let collection = Arc::new(Collection::new(name.to_string(), dimensions, metric)?);

        // insert returns Err if the key already exists
        if self
            .inner
            .collections
            .insert(name.to_string(), collection.clone())
            .is_err()
        {
            return Err(Error::CollectionExists(name.to_string()));
        }

        self.persist(&collection).await
    }

    /// Delete a collection and its files.
    #[instrument(skip(self))]
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        info!(name, "Deleting collection");

        if self.inner.collections.remove(name).is_none() {
            return Err(Error::CollectionNotFound(name.to_string()));
        }

        if let Some(ref path) = self.inner.config.data_path {
            persistence::delete_collection_files(path, name).await?;
        }

        Ok(())
    }

    /// Check if a collection exists.
    pub fn collection_exists(&self, name: &str) -> bool {
        self.inner.collections.contains(name)
    }

    /// Get a handle to a collection.
    pub fn get_collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.inner
            .collections
            .read(name, |_, v| v.clone())
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    /// Insert records into a collection and persist it.
    ///
    /// Returns the number of records inserted.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn insert_batch(&self, collection: &str, records: Vec<Record>) -> Result<usize> {
        let col = self.get_collection(collection)?;
        let inserted = col.insert_batch(records)?;
        self.persist(&col).await?;
        debug!(collection, inserted, "Inserted records");
        Ok(inserted)
    }

    /// Search a collection for the `limit` records most similar to `query`.
    pub fn search(&self, collection: &str, query: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let col = self.get_collection(collection)?;
        let results = col.search(query, limit)?;
        debug!(collection, count = results.len(), "Search completed");
        Ok(results)
    }

    /// Number of records in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.get_collection(collection)?.len())
    }

    async fn persist(&self, collection: &Collection) -> Result<()> {
        if let Some(ref path) = self.inner.config.data_path {
            persistence::save_collection(path, collection).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, vector: Vec<f32>, text: &str) -> Record {
        Record::new(id, vector)
            .with_document(text)
            .with_metadata(VectorMetadata::from_pairs([("source", format!("{id}.txt"))]))
    }

    #[tokio::test]
    async fn test_memory_db_roundtrip() {
        let db = VectorDb::open(Config::memory()).await.unwrap();
        db.create_collection("docs", 2, DistanceMetric::Cosine)
            .await
            .unwrap();

        db.insert_batch(
            "docs",
            vec![
                record("0", vec![1.0, 0.0], "east"),
                record("1", vec![0.0, 1.0], "north"),
            ],
        )
        .await
        .unwrap();

        let hits = db.search("docs", &[0.1, 0.9], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.as_deref(), Some("north"));
        assert_eq!(hits[0].metadata.get("source"), Some("1.txt"));
        assert_eq!(db.count("docs").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_collection() {
        let db = VectorDb::open(Config::memory()).await.unwrap();
        db.create_collection("docs", 2, DistanceMetric::Cosine)
            .await
            .unwrap();

        let err = db
            .create_collection("docs", 2, DistanceMetric::Cosine)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CollectionExists(_)));
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let db = VectorDb::open(Config::memory()).await.unwrap();
        assert!(!db.collection_exists("nope"));
        assert!(matches!(
            db.search("nope", &[1.0], 3),
            Err(Error::CollectionNotFound(_))
        ));
        assert!(db.delete_collection("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_persistent_db_reopens_with_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store");

        {
            let db = VectorDb::open(Config::persistent(&path)).await.unwrap();
            db.create_collection("kb", 2, DistanceMetric::Cosine)
                .await
                .unwrap();
            db.insert_batch("kb", vec![record("0", vec![1.0, 0.0], "zero")])
                .await
                .unwrap();
        }

        let reopened = VectorDb::open(Config::persistent(&path)).await.unwrap();
        assert!(reopened.collection_exists("kb"));
        assert_eq!(reopened.count("kb").unwrap(), 1);

        let hits = reopened.search("kb", &[1.0, 0.0], 3).unwrap();
        assert_eq!(hits[0].id, "0");
        assert_eq!(hits[0].document.as_deref(), Some("zero"));
    }

    #[tokio::test]
    async fn test_delete_removes_files() {
        let temp_dir = TempDir::new().unwrap();
        let db = VectorDb::open(Config::persistent(temp_dir.path()))
            .await
            .unwrap();
        db.create_collection("kb", 2, DistanceMetric::Cosine)
            .await
            .unwrap();
        assert!(temp_dir.path().join("kb").exists());

        db.delete_collection("kb").await.unwrap();
        assert!(!temp_dir.path().join("kb").exists());
        assert!(!db.collection_exists("kb"));
    }
}
