//! Configuration for ragchat-vector.

use std::path::PathBuf;

/// Configuration for the vector database.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path to store data on disk. If None, data is kept in memory only.
    pub data_path: Option<PathBuf>,
}

impl Config {
    /// Create an in-memory configuration.
    ///
    /// Data will not be persisted and will be lost when the process exits.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Create a persistent configuration.
    ///
    /// Collections are written below `path` after every mutation and loaded
    /// again by [`VectorDb::open`](crate::VectorDb::open).
    pub fn persistent<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            data_path: Some(path.into()),
        }
    }

    /// Whether this configuration persists to disk.
    pub fn is_persistent(&self) -> bool {
        self.data_path.is_some()
    }
}
