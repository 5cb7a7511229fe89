//! Common types for ragchat-vector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a record in a collection.
pub type VectorId = String;

/// String key-value metadata stored alongside a record.
///
/// Keys are kept sorted so persisted files are stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorMetadata {
    data: BTreeMap<String, String>,
}

impl VectorMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create metadata from a list of key-value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Insert a key-value pair.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.data.insert(key.into(), value.into());
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Check if metadata is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of metadata entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// A record as inserted into and persisted by a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// External string ID.
    pub id: VectorId,
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Original document text the vector was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Metadata associated with the record.
    #[serde(default)]
    pub metadata: VectorMetadata,
}

impl Record {
    /// Create a record with no document text and no metadata.
    pub fn new(id: impl Into<VectorId>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            document: None,
            metadata: VectorMetadata::new(),
        }
    }

    /// Attach the source document text.
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: VectorMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Result of a vector search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// ID of the matched record.
    pub id: VectorId,
    /// Similarity score (higher = more similar).
    pub score: f32,
    /// Document text stored with the record.
    pub document: Option<String>,
    /// Metadata stored with the record.
    pub metadata: VectorMetadata,
}
