//! Persistence layer for ragchat-vector.
//!
//! Each collection lives in its own directory below the data path:
//!
//! - `{base_path}/{name}/metadata.json` - Collection metadata
//! - `{base_path}/{name}/vectors.json` - Records in insertion order

use crate::collection::Collection;
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::types::Record;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const METADATA_FILE: &str = "metadata.json";
const VECTORS_FILE: &str = "vectors.json";

/// Collection metadata stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionMetadata {
    name: String,
    dimensions: usize,
    metric: String,
}

/// Write `contents` to `path` through a temporary sibling file so a crash
/// never leaves a half-written file behind.
async fn write_atomic(path: &Path, contents: String) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Save a collection to disk.
pub async fn save_collection(base_path: &Path, collection: &Collection) -> Result<()> {
    let collection_path = base_path.join(collection.name());
    tokio::fs::create_dir_all(&collection_path).await?;

    let metadata = CollectionMetadata {
        name: collection.name().to_string(),
        dimensions: collection.dimensions(),
        metric: collection.metric().name().to_string(),
    };
    let metadata_json = serde_json::to_string_pretty(&metadata)
        .map_err(|e| Error::Persistence(format!("Failed to serialize metadata: {}", e)))?;
    write_atomic(&collection_path.join(METADATA_FILE), metadata_json).await?;

    let records = collection.records();
    let vectors_json = serde_json::to_string(&records)
        .map_err(|e| Error::Persistence(format!("Failed to serialize vectors: {}", e)))?;
    write_atomic(&collection_path.join(VECTORS_FILE), vectors_json).await?;

    debug!(
        name = collection.name(),
        count = records.len(),
        path = ?collection_path,
        "Saved collection"
    );
    Ok(())
}

/// Load a collection from disk.
pub async fn load_collection(base_path: &Path, name: &str) -> Result<Collection> {
    let collection_path = base_path.join(name);
    let metadata_path = collection_path.join(METADATA_FILE);

    if !metadata_path.exists() {
        return Err(Error::CollectionNotFound(name.to_string()));
    }

    let metadata_json = tokio::fs::read_to_string(&metadata_path).await?;
    let metadata: CollectionMetadata = serde_json::from_str(&metadata_json)
        .map_err(|e| Error::Persistence(format!("Failed to parse metadata: {}", e)))?;

    let metric: DistanceMetric = metadata.metric.parse().map_err(Error::Persistence)?;
    let collection = Collection::new(metadata.name.clone(), metadata.dimensions, metric)?;

    let vectors_path = collection_path.join(VECTORS_FILE);
    if vectors_path.exists() {
        let vectors_json = tokio::fs::read_to_string(&vectors_path).await?;
        let records: Vec<Record> = serde_json::from_str(&vectors_json)
            .map_err(|e| Error::Persistence(format!("Failed to parse vectors: {}", e)))?;
        collection.insert_batch(records)?;
    }

    info!(
        name,
        dimensions = metadata.dimensions,
        count = collection.len(),
        "Loaded collection"
    );
    Ok(collection)
}

/// Names of all collections persisted below `base_path`, sorted.
pub async fn list_persisted(base_path: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(base_path).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path: PathBuf = entry.path();
        if path.is_dir() && path.join(METADATA_FILE).exists() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

/// Remove a collection's directory.
pub async fn delete_collection_files(base_path: &Path, name: &str) -> Result<()> {
    let collection_path = base_path.join(name);
    if collection_path.exists() {
        tokio::fs::remove_dir_all(&collection_path).await?;
    }
    Ok(())
}
