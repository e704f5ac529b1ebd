//! Search error types.

use artifact_types::ContextId;
use thiserror::Error;

/// Errors that can occur in index engine operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Repository walk error
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// JSON encoding/decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Index is locked (writer mutex poisoned)
    #[error("Index is locked: {0}")]
    IndexLocked(String),

    /// The context has been closed and accepts no further operations
    #[error("Index context already closed: {0}")]
    ContextClosed(String),

    /// No context registered under this id
    #[error("Index context not found: {0}")]
    ContextNotFound(ContextId),

    /// Artifact path does not form valid coordinates
    #[error("Invalid artifact coordinate: {0}")]
    InvalidCoordinate(String),

    /// Packed snapshot is missing or malformed
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
