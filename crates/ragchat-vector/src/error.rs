//! Error types for ragchat-vector.

use thiserror::Error;

/// Result type for ragchat-vector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ragchat-vector operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Collection already exists.
    #[error("Collection '{0}' already exists")]
    CollectionExists(String),

    /// Collection not found.
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    /// An entry with this id is already stored in the collection.
    #[error("Entry '{0}' already exists")]
    DuplicateId(String),

    /// Dimension mismatch between vector and collection.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions.
        expected: usize,
        /// Actual dimensions provided.
        actual: usize,
    },

    /// Invalid vector (empty, or contains NaN/infinite values).
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Persistence error (serialization, corrupt files).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
