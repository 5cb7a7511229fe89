//! API request handlers.

/// Health and index status handlers.
pub mod index;
/// Chat session handlers.
pub mod sessions;
