//! Error types shared by the artifact indexer crates.

use thiserror::Error;

/// Unified error type for domain and configuration operations.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Repository not configured
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
