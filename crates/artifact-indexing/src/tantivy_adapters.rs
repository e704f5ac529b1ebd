//! Collaborators backed by the Tantivy index engine.
//!
//! All four adapters share one [`ContextTable`], so a context opened by the
//! provider is visible to the engine, extractor and publisher.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use artifact_search::{
    extract_artifact, pack_index, scan_repository, ArtifactIndexer, ArtifactSearcher,
    ContextTable, IndexContext,
};
use artifact_types::{
    ArtifactDescriptor, ArtifactQuery, ArtifactRecord, ContextId, ManagedRepository, ScanMode,
    ScanStats,
};

use crate::collaborators::{ContextProvider, DescriptorExtractor, IndexEngine, IndexPublisher};
use crate::error::BoxError;
use crate::executor::{ExecutorConfig, IndexingTaskExecutor};

/// Opens contexts through the shared table.
pub struct TantivyContextProvider {
    table: Arc<ContextTable>,
}

impl TantivyContextProvider {
    pub fn new(table: Arc<ContextTable>) -> Self {
        Self { table }
    }
}

impl ContextProvider for TantivyContextProvider {
    fn create_context(&self, repository: &ManagedRepository) -> Result<ContextId, BoxError> {
        Ok(self.table.open_for(repository)?)
    }

    fn index_directory(&self, context: ContextId) -> Option<PathBuf> {
        self.table.get(context).ok()?.index_directory()
    }

    fn update_timestamp(&self, context: ContextId, persist: bool) -> Result<(), BoxError> {
        self.table.get(context)?.update_timestamp(persist)?;
        Ok(())
    }
}

/// Maven-2 layout extraction relative to the context's repository root.
pub struct LayoutExtractor {
    table: Arc<ContextTable>,
}

impl LayoutExtractor {
    pub fn new(table: Arc<ContextTable>) -> Self {
        Self { table }
    }
}

impl DescriptorExtractor for LayoutExtractor {
    fn extract(&self, context: ContextId, file: &Path) -> Result<Option<ArtifactRecord>, BoxError> {
        let ctx = self.table.get(context)?;
        Ok(extract_artifact(ctx.repository_root(), file)?)
    }
}

/// Index mutations, lookups, scans and optimize on the live index.
///
/// Adds and deletes are committed immediately so the next search sees them.
pub struct TantivyIndexEngine {
    table: Arc<ContextTable>,
}

impl TantivyIndexEngine {
    pub fn new(table: Arc<ContextTable>) -> Self {
        Self { table }
    }

    fn context(&self, context: ContextId) -> Result<Arc<IndexContext>, BoxError> {
        Ok(self.table.get(context)?)
    }
}

impl IndexEngine for TantivyIndexEngine {
    fn add_entry(&self, context: ContextId, record: &ArtifactRecord) -> Result<(), BoxError> {
        let ctx = self.context(context)?;
        let indexer = ArtifactIndexer::new(&ctx);
        indexer.add(record)?;
        indexer.commit()?;
        Ok(())
    }

    fn delete_entry(
        &self,
        context: ContextId,
        descriptor: &ArtifactDescriptor,
    ) -> Result<(), BoxError> {
        let ctx = self.context(context)?;
        let indexer = ArtifactIndexer::new(&ctx);
        indexer.delete(&descriptor.uinfo())?;
        indexer.commit()?;
        Ok(())
    }

    fn search(
        &self,
        context: ContextId,
        query: &ArtifactQuery,
        limit: usize,
    ) -> Result<Vec<ArtifactDescriptor>, BoxError> {
        let ctx = self.context(context)?;
        let records = ArtifactSearcher::new(&ctx).search(query, limit)?;
        Ok(records.into_iter().map(|r| r.descriptor).collect())
    }

    fn scan(&self, context: ContextId, mode: ScanMode) -> Result<ScanStats, BoxError> {
        let ctx = self.context(context)?;
        Ok(scan_repository(&ctx, mode)?)
    }

    fn optimize(&self, context: ContextId) -> Result<(), BoxError> {
        let ctx = self.context(context)?;
        ArtifactIndexer::new(&ctx).optimize()?;
        Ok(())
    }
}

/// Packs gzip JSON-lines snapshots.
pub struct SnapshotPublisher {
    table: Arc<ContextTable>,
}

impl SnapshotPublisher {
    pub fn new(table: Arc<ContextTable>) -> Self {
        Self { table }
    }
}

impl IndexPublisher for SnapshotPublisher {
    fn pack(&self, context: ContextId, target: &Path) -> Result<(), BoxError> {
        let ctx = self.table.get(context)?;
        let summary = pack_index(&ctx, target)?;
        debug!(entries = summary.entries, path = ?summary.snapshot_path, "Published snapshot");
        Ok(())
    }
}

/// Build an executor whose collaborators all share `table`.
pub fn tantivy_executor(table: Arc<ContextTable>, config: ExecutorConfig) -> IndexingTaskExecutor {
    IndexingTaskExecutor::new(
        Arc::new(TantivyContextProvider::new(table.clone())),
        Arc::new(LayoutExtractor::new(table.clone())),
        Arc::new(TantivyIndexEngine::new(table.clone())),
        Arc::new(SnapshotPublisher::new(table)),
        config,
    )
}
