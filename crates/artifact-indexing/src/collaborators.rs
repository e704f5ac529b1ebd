//! Capabilities the executor depends on.
//!
//! Each trait is injected into the executor as `Arc<dyn Trait>`. Production
//! implementations live in [`crate::tantivy_adapters`]; tests use fakes.

use std::path::{Path, PathBuf};

use artifact_types::{
    ArtifactDescriptor, ArtifactQuery, ArtifactRecord, ContextId, ManagedRepository, ScanMode,
    ScanStats,
};

use crate::error::BoxError;

/// Creates index contexts and manages their directory and timestamp.
pub trait ContextProvider: Send + Sync {
    /// Open a context for the repository. Never yields two open contexts
    /// for the same repository.
    fn create_context(&self, repository: &ManagedRepository) -> Result<ContextId, BoxError>;

    /// Index directory of the context; None when it is closed or unknown.
    fn index_directory(&self, context: ContextId) -> Option<PathBuf>;

    /// Mark the context as updated now; `persist` also records it on disk.
    fn update_timestamp(&self, context: ContextId, persist: bool) -> Result<(), BoxError>;
}

/// Derives artifact records from repository files.
pub trait DescriptorExtractor: Send + Sync {
    /// `Ok(None)` means the file is not an artifact.
    fn extract(&self, context: ContextId, file: &Path) -> Result<Option<ArtifactRecord>, BoxError>;
}

/// Mutation and lookup primitives of the index.
pub trait IndexEngine: Send + Sync {
    fn add_entry(&self, context: ContextId, record: &ArtifactRecord) -> Result<(), BoxError>;

    /// Remove every entry with the descriptor's identity. Absent entries are not an error.
    fn delete_entry(&self, context: ContextId, descriptor: &ArtifactDescriptor)
        -> Result<(), BoxError>;

    fn search(
        &self,
        context: ContextId,
        query: &ArtifactQuery,
        limit: usize,
    ) -> Result<Vec<ArtifactDescriptor>, BoxError>;

    /// Rebuild or reconcile the index from the repository contents.
    fn scan(&self, context: ContextId, mode: ScanMode) -> Result<ScanStats, BoxError>;

    /// Compact the index.
    fn optimize(&self, context: ContextId) -> Result<(), BoxError>;
}

/// Publishes a servable snapshot of the index.
pub trait IndexPublisher: Send + Sync {
    /// Write the snapshot into `target`, replacing any previous one atomically.
    fn pack(&self, context: ContextId, target: &Path) -> Result<(), BoxError>;
}
