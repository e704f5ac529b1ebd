//! Index contexts and the table that owns them.
//!
//! A context binds one repository to its live Tantivy index. Callers hold
//! only a `ContextId`; the table resolves it to the shared `IndexContext`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use tantivy::{IndexReader, IndexWriter, Searcher};
use tracing::{debug, info};

use artifact_types::{ContextId, ManagedRepository};

use crate::error::SearchError;
use crate::index::{live_index_path, LiveIndex, DEFAULT_WRITER_MEMORY_MB};
use crate::schema::ArtifactSchema;

/// Where live indexes are kept and how much memory their writers get.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Parent directory of every live index (one subdirectory per repository id)
    pub index_root: PathBuf,
    /// Memory budget for each writer in MB
    pub writer_memory_mb: usize,
}

impl ContextConfig {
    pub fn new(index_root: impl Into<PathBuf>) -> Self {
        Self {
            index_root: index_root.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }

    /// Live index path for a repository.
    pub fn index_path_for(&self, repository_id: &str) -> PathBuf {
        live_index_path(&self.index_root, repository_id)
    }
}

/// A repository's live index together with its writer, reader and timestamp.
pub struct IndexContext {
    id: ContextId,
    repository: ManagedRepository,
    index: LiveIndex,
    reader: IndexReader,
    writer: Mutex<Option<IndexWriter>>,
    index_dir: RwLock<Option<PathBuf>>,
    timestamp: Mutex<Option<DateTime<Utc>>>,
}

impl IndexContext {
    /// Open (or create) the live index of `repository` under `config`.
    pub fn open(
        id: ContextId,
        repository: ManagedRepository,
        config: &ContextConfig,
    ) -> Result<Self, SearchError> {
        let index = LiveIndex::open(&config.index_root, &repository.id, config.writer_memory_mb)?;
        let reader = index.reader()?;
        let writer = index.writer()?;
        let timestamp = index.read_timestamp();
        let index_dir = index.path().to_path_buf();

        info!(
            context = %id,
            repository = %repository.id,
            path = ?index_dir,
            "Opened index context"
        );

        Ok(Self {
            id,
            repository,
            index,
            reader,
            writer: Mutex::new(Some(writer)),
            index_dir: RwLock::new(Some(index_dir)),
            timestamp: Mutex::new(timestamp),
        })
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn repository(&self) -> &ManagedRepository {
        &self.repository
    }

    pub fn repository_id(&self) -> &str {
        &self.repository.id
    }

    pub fn repository_root(&self) -> &Path {
        self.repository.location()
    }

    pub fn schema(&self) -> &ArtifactSchema {
        self.index.schema()
    }

    pub fn live_index(&self) -> &LiveIndex {
        &self.index
    }

    /// Live index directory, or None once the context is closed.
    pub fn index_directory(&self) -> Option<PathBuf> {
        self.index_dir.read().ok().and_then(|dir| dir.clone())
    }

    pub fn is_open(&self) -> bool {
        self.index_directory().is_some()
    }

    /// Run `f` against the writer. Fails with ContextClosed after `close`.
    pub fn with_writer<T>(
        &self,
        f: impl FnOnce(&mut IndexWriter) -> Result<T, SearchError>,
    ) -> Result<T, SearchError> {
        let mut slot = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;
        match slot.as_mut() {
            Some(writer) => f(writer),
            None => Err(SearchError::ContextClosed(self.id.to_string())),
        }
    }

    /// Make committed changes visible to the next searcher.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        Ok(())
    }

    /// A searcher over the latest commit.
    pub fn searcher(&self) -> Result<Searcher, SearchError> {
        self.reload()?;
        Ok(self.reader.searcher())
    }

    /// Record the current time as the index timestamp.
    ///
    /// With `persist` the timestamp is also written next to the live index.
    pub fn update_timestamp(&self, persist: bool) -> Result<DateTime<Utc>, SearchError> {
        let now = Utc::now();
        {
            let mut slot = self
                .timestamp
                .lock()
                .map_err(|e| SearchError::IndexLocked(e.to_string()))?;
            *slot = Some(now);
        }

        if persist {
            if !self.is_open() {
                return Err(SearchError::ContextClosed(self.id.to_string()));
            }
            self.index.write_timestamp(now)?;
            debug!(context = %self.id, timestamp = %now, "Persisted index timestamp");
        }

        Ok(now)
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.lock().ok().and_then(|ts| *ts)
    }

    /// Commit pending changes, release the writer and mark the context closed.
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<(), SearchError> {
        let writer = {
            let mut slot = self
                .writer
                .lock()
                .map_err(|e| SearchError::IndexLocked(e.to_string()))?;
            slot.take()
        };

        if let Ok(mut dir) = self.index_dir.write() {
            *dir = None;
        }

        if let Some(mut writer) = writer {
            writer.commit()?;
            writer.wait_merging_threads()?;
            info!(context = %self.id, repository = %self.repository.id, "Closed index context");
        }
        Ok(())
    }
}

/// Owns every index context and hands out their ids.
///
/// At most one open context exists per repository id.
pub struct ContextTable {
    config: ContextConfig,
    next_id: AtomicU64,
    contexts: RwLock<HashMap<ContextId, Arc<IndexContext>>>,
}

impl ContextTable {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            contexts: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Open a context for `repository`, reusing the open one if it exists.
    pub fn open_for(&self, repository: &ManagedRepository) -> Result<ContextId, SearchError> {
        let mut contexts = self
            .contexts
            .write()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        if let Some(existing) = contexts
            .values()
            .find(|ctx| ctx.repository_id() == repository.id && ctx.is_open())
        {
            debug!(context = %existing.id(), repository = %repository.id, "Reusing index context");
            return Ok(existing.id());
        }

        let id = ContextId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let context = IndexContext::open(id, repository.clone(), &self.config)?;
        contexts.insert(id, Arc::new(context));
        Ok(id)
    }

    /// Resolve an id to its context. Closed contexts still resolve.
    pub fn get(&self, id: ContextId) -> Result<Arc<IndexContext>, SearchError> {
        let contexts = self
            .contexts
            .read()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;
        contexts
            .get(&id)
            .cloned()
            .ok_or(SearchError::ContextNotFound(id))
    }

    pub fn close(&self, id: ContextId) -> Result<(), SearchError> {
        self.get(id)?.close()
    }

    /// Close every open context. Returns how many were closed.
    pub fn close_all(&self) -> Result<usize, SearchError> {
        let open: Vec<Arc<IndexContext>> = {
            let contexts = self
                .contexts
                .read()
                .map_err(|e| SearchError::IndexLocked(e.to_string()))?;
            contexts.values().filter(|c| c.is_open()).cloned().collect()
        };

        for ctx in &open {
            ctx.close()?;
        }
        Ok(open.len())
    }

    /// Number of registered contexts, open or closed.
    pub fn len(&self) -> usize {
        self.contexts.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TIMESTAMP_FILE;
    use tempfile::TempDir;

    fn table(dir: &TempDir) -> ContextTable {
        ContextTable::new(ContextConfig::new(dir.path().join("indexes")).with_memory_mb(15))
    }

    fn repository(dir: &TempDir, id: &str) -> ManagedRepository {
        ManagedRepository::new(id, dir.path().join(id))
    }

    #[test]
    fn test_open_for_creates_index_under_root() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let id = table.open_for(&repository(&dir, "internal")).unwrap();

        let ctx = table.get(id).unwrap();
        assert_eq!(
            ctx.index_directory(),
            Some(dir.path().join("indexes").join("internal"))
        );
        assert!(ctx.live_index().path().join("meta.json").exists());
    }

    #[test]
    fn test_open_for_reuses_live_context() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let repo = repository(&dir, "internal");

        let first = table.open_for(&repo).unwrap();
        let second = table.open_for(&repo).unwrap();
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_closed_context_is_replaced() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let repo = repository(&dir, "internal");

        let first = table.open_for(&repo).unwrap();
        table.close(first).unwrap();
        let second = table.open_for(&repo).unwrap();

        assert_ne!(first, second);
        assert!(table.get(first).unwrap().index_directory().is_none());
        assert!(table.get(second).unwrap().is_open());
    }

    #[test]
    fn test_closed_context_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let id = table.open_for(&repository(&dir, "internal")).unwrap();
        let ctx = table.get(id).unwrap();

        ctx.close().unwrap();
        ctx.close().unwrap();

        let result = ctx.with_writer(|_| Ok(()));
        assert!(matches!(result, Err(SearchError::ContextClosed(_))));
        assert!(matches!(
            ctx.update_timestamp(true),
            Err(SearchError::ContextClosed(_))
        ));
    }

    #[test]
    fn test_unknown_context() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let result = table.get(ContextId::new(42));
        assert!(matches!(result, Err(SearchError::ContextNotFound(_))));
    }

    #[test]
    fn test_update_timestamp_persists() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let id = table.open_for(&repository(&dir, "internal")).unwrap();
        let ctx = table.get(id).unwrap();
        assert!(ctx.timestamp().is_none());

        ctx.update_timestamp(false).unwrap();
        let index_dir = ctx.index_directory().unwrap();
        assert!(ctx.timestamp().is_some());
        assert!(!index_dir.join(TIMESTAMP_FILE).exists());

        let persisted = ctx.update_timestamp(true).unwrap();
        assert!(index_dir.join(TIMESTAMP_FILE).exists());

        table.close(id).unwrap();
        let reopened = table.open_for(&repository(&dir, "internal")).unwrap();
        let restored = table.get(reopened).unwrap().timestamp().unwrap();
        assert_eq!(restored.timestamp_millis(), persisted.timestamp_millis());
    }

    #[test]
    fn test_close_all() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        table.open_for(&repository(&dir, "a")).unwrap();
        table.open_for(&repository(&dir, "b")).unwrap();

        assert_eq!(table.close_all().unwrap(), 2);
        assert_eq!(table.close_all().unwrap(), 0);
    }
}
