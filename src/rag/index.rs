//! Persistent knowledge index.
//!
//! The index is built once from the loaded documents and reused on later
//! starts. A small manifest next to the store records that the collection
//! was populated and a fingerprint of the document set it was built from,
//! so a changed knowledge folder is noticed (and reported) without being
//! silently re-ingested.

use crate::db::VectorStore;
use crate::rag::embeddings::Embedder;
use crate::types::{AppError, IndexEntry, QueryResult, Result, SourceDocument};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const MANIFEST_VERSION: u32 = 1;

/// How `setup` treats an existing index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexPolicy {
    /// Keep a populated index as is.
    #[default]
    Reuse,
    /// Drop the collection and manifest, then index the documents again.
    Rebuild,
}

/// Persisted record of a completed population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u32,
    pub populated: bool,
    pub document_count: usize,
    pub fingerprint: String,
    pub built_at: DateTime<Utc>,
}

/// What `setup` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Documents were embedded and inserted.
    Populated { count: usize },
    /// The index was already populated; nothing was inserted.
    Reused { count: usize, stale: bool },
    /// The collection had entries but no manifest; it was adopted as is.
    Adopted { count: usize },
    /// There were no documents to index.
    Empty,
}

/// Snapshot of the index for status output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    pub collection: String,
    pub exists: bool,
    pub entries: usize,
    pub store: String,
    pub embedder: String,
    pub dimensions: usize,
    pub manifest: Option<IndexManifest>,
}

/// Fingerprint of a document set: SHA-256 over sorted `(source, length)` pairs.
pub fn fingerprint(documents: &[SourceDocument]) -> String {
    let mut pairs: Vec<(&str, usize)> = documents
        .iter()
        .map(|d| (d.source.as_str(), d.text.len()))
        .collect();
    pairs.sort();

    let mut hasher = Sha256::new();
    for (source, len) in pairs {
        hasher.update(source.as_bytes());
        hasher.update([0u8]);
        hasher.update(len.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

/// The document collection plus its build manifest.
pub struct KnowledgeIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    manifest_path: Option<PathBuf>,
    manifest: RwLock<Option<IndexManifest>>,
}

impl KnowledgeIndex {
    /// Open the index, reading the manifest from `manifest_path` if it exists.
    ///
    /// Without a manifest path the manifest lives only in memory.
    pub async fn open(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
        manifest_path: Option<PathBuf>,
    ) -> Result<Self> {
        let manifest = match manifest_path {
            Some(ref path) if tokio::fs::try_exists(path).await.unwrap_or(false) => {
                let data = tokio::fs::read_to_string(path).await.map_err(|e| {
                    AppError::Database(format!("Failed to read {}: {}", path.display(), e))
                })?;
                let manifest: IndexManifest = serde_json::from_str(&data).map_err(|e| {
                    AppError::Database(format!("Corrupt index manifest {}: {}", path.display(), e))
                })?;
                Some(manifest)
            }
            _ => None,
        };

        Ok(Self {
            store,
            embedder,
            collection: collection.into(),
            manifest_path,
            manifest: RwLock::new(manifest),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn manifest(&self) -> Option<IndexManifest> {
        self.manifest.read().clone()
    }

    /// Make sure the index holds the documents, populating it at most once.
    #[instrument(skip(self, documents), fields(collection = %self.collection, documents = documents.len()))]
    pub async fn setup(
        &self,
        documents: &[SourceDocument],
        policy: IndexPolicy,
    ) -> Result<SetupOutcome> {
        if policy == IndexPolicy::Rebuild {
            self.reset().await?;
        }

        let current = fingerprint(documents);
        let exists = self.store.collection_exists(&self.collection).await?;

        let manifest = self.manifest();
        if let Some(m) = manifest.filter(|m| m.populated) {
            if exists {
                self.check_dimensions().await?;
                let count = self.store.count(&self.collection).await?;
                let stale = m.fingerprint != current;
                if stale {
                    warn!(
                        indexed = m.document_count,
                        found = documents.len(),
                        "Knowledge folder changed since the index was built; run `ragchat index --rebuild` to refresh it"
                    );
                }
                info!(count, "Index already populated");
                return Ok(SetupOutcome::Reused { count, stale });
            }
            warn!("Index manifest found without a collection; rebuilding");
        }

        if exists {
            self.check_dimensions().await?;
        } else {
            self.store
                .create_collection(&self.collection, self.embedder.dimensions())
                .await?;
        }

        let count = self.store.count(&self.collection).await?;
        if count > 0 {
            info!(count, "Adopting existing collection");
            self.write_manifest(count, current).await?;
            return Ok(SetupOutcome::Adopted { count });
        }

        if documents.is_empty() {
            info!("No documents to index");
            return Ok(SetupOutcome::Empty);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed_texts(&texts).await?;

        let entries: Vec<IndexEntry> = documents
            .iter()
            .enumerate()
            .map(|(i, d)| IndexEntry {
                id: i.to_string(),
                text: d.text.clone(),
                source: d.source.clone(),
            })
            .collect();

        let added = self
            .store
            .add(&self.collection, &entries, &embeddings)
            .await?;
        self.write_manifest(added, current).await?;

        info!(count = added, embedder = self.embedder.name(), "Index populated");
        Ok(SetupOutcome::Populated { count: added })
    }

    /// Return up to `n` entries nearest to `text`, best first.
    ///
    /// A missing or empty collection yields an empty result.
    #[instrument(skip(self, text))]
    pub async fn query(&self, text: &str, n: usize) -> Result<QueryResult> {
        if n == 0 || !self.store.collection_exists(&self.collection).await? {
            return Ok(QueryResult::default());
        }
        if self.store.count(&self.collection).await? == 0 {
            return Ok(QueryResult::default());
        }

        let embedding = self.embedder.embed(text).await?;
        let hits = self.store.query(&self.collection, &embedding, n).await?;
        debug!(hits = hits.len(), "Index query");
        Ok(QueryResult::new(hits))
    }

    /// Number of stored entries (0 if the collection doesn't exist).
    pub async fn count(&self) -> Result<usize> {
        if !self.store.collection_exists(&self.collection).await? {
            return Ok(0);
        }
        self.store.count(&self.collection).await
    }

    pub async fn status(&self) -> Result<IndexStatus> {
        let exists = self.store.collection_exists(&self.collection).await?;
        let entries = if exists {
            self.store.count(&self.collection).await?
        } else {
            0
        };

        Ok(IndexStatus {
            collection: self.collection.clone(),
            exists,
            entries,
            store: self.store.provider_name().to_string(),
            embedder: self.embedder.name().to_string(),
            dimensions: self.embedder.dimensions(),
            manifest: self.manifest(),
        })
    }

    async fn check_dimensions(&self) -> Result<()> {
        let stats = self.store.collection_stats(&self.collection).await?;
        if stats.dimensions != self.embedder.dimensions() {
            return Err(AppError::Configuration(format!(
                "Collection '{}' holds {}-dimensional vectors but the '{}' embedder produces {}; run `ragchat index --rebuild`",
                self.collection,
                stats.dimensions,
                self.embedder.name(),
                self.embedder.dimensions()
            )));
        }
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        info!("Dropping existing index");
        if self.store.collection_exists(&self.collection).await? {
            self.store.delete_collection(&self.collection).await?;
        }
        if let Some(ref path) = self.manifest_path {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                tokio::fs::remove_file(path).await.map_err(|e| {
                    AppError::Database(format!("Failed to remove {}: {}", path.display(), e))
                })?;
            }
        }
        *self.manifest.write() = None;
        Ok(())
    }

    async fn write_manifest(&self, document_count: usize, fingerprint: String) -> Result<()> {
        let manifest = IndexManifest {
            version: MANIFEST_VERSION,
            populated: true,
            document_count,
            fingerprint,
            built_at: Utc::now(),
        };

        if let Some(ref path) = self.manifest_path {
            let data = serde_json::to_string_pretty(&manifest)
                .map_err(|e| AppError::Internal(format!("Failed to serialize manifest: {}", e)))?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::Database(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
            tokio::fs::write(path, data).await.map_err(|e| {
                AppError::Database(format!("Failed to write {}: {}", path.display(), e))
            })?;
        }

        *self.manifest.write() = Some(manifest);
        Ok(())
    }
}
