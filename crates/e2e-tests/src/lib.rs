//! End-to-end test infrastructure for the artifact indexer.
//!
//! Provides a [`TestRepository`] harness: a temporary Maven-layout
//! repository indexed by the real Tantivy stack, with the engine and
//! publisher wrapped so tests can assert on the calls the executor makes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use artifact_indexing::{
    BoxError, ContextProvider, ExecutorConfig, IndexEngine, IndexPublisher, IndexingTask,
    IndexingTaskExecutor, LayoutExtractor, SnapshotPublisher, TantivyContextProvider,
    TantivyIndexEngine, TaskExecutionError, TaskOutcome,
};
use artifact_search::{read_snapshot, ArtifactSearcher, ContextConfig, ContextTable, PackedSnapshot};
use artifact_types::{
    ArtifactDescriptor, ArtifactQuery, ArtifactRecord, ContextId, ManagedRepository, ScanMode,
    ScanStats,
};

/// Release jar used by most tests.
pub const LIB_JAR: &str = "com/x/lib/1.0/lib-1.0.jar";

/// Identity of [`LIB_JAR`].
pub fn lib_descriptor() -> ArtifactDescriptor {
    ArtifactDescriptor::new("com.x", "lib", "1.0").with_packaging("jar")
}

/// A call observed at the engine or publisher boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Search,
    Add(String),
    Delete(String),
    Scan(ScanMode),
    Optimize,
    Pack(PathBuf),
}

#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<EngineCall>>,
}

impl CallLog {
    fn push(&self, call: EngineCall) {
        self.calls.lock().expect("call log poisoned").push(call);
    }

    pub fn take(&self) -> Vec<EngineCall> {
        std::mem::take(&mut *self.calls.lock().expect("call log poisoned"))
    }
}

/// Real engine that records every call before delegating.
struct RecordingEngine {
    inner: TantivyIndexEngine,
    log: Arc<CallLog>,
}

impl IndexEngine for RecordingEngine {
    fn add_entry(&self, context: ContextId, record: &ArtifactRecord) -> Result<(), BoxError> {
        self.log.push(EngineCall::Add(record.uinfo()));
        self.inner.add_entry(context, record)
    }

    fn delete_entry(&self, context: ContextId, descriptor: &ArtifactDescriptor) -> Result<(), BoxError> {
        self.log.push(EngineCall::Delete(descriptor.uinfo()));
        self.inner.delete_entry(context, descriptor)
    }

    fn search(
        &self,
        context: ContextId,
        query: &ArtifactQuery,
        limit: usize,
    ) -> Result<Vec<ArtifactDescriptor>, BoxError> {
        self.log.push(EngineCall::Search);
        self.inner.search(context, query, limit)
    }

    fn scan(&self, context: ContextId, mode: ScanMode) -> Result<ScanStats, BoxError> {
        self.log.push(EngineCall::Scan(mode));
        self.inner.scan(context, mode)
    }

    fn optimize(&self, context: ContextId) -> Result<(), BoxError> {
        self.log.push(EngineCall::Optimize);
        self.inner.optimize(context)
    }
}

struct RecordingPublisher {
    inner: SnapshotPublisher,
    log: Arc<CallLog>,
}

impl IndexPublisher for RecordingPublisher {
    fn pack(&self, context: ContextId, target: &Path) -> Result<(), BoxError> {
        self.log.push(EngineCall::Pack(target.to_path_buf()));
        self.inner.pack(context, target)
    }
}

/// Shared test harness for E2E tests.
pub struct TestRepository {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Repository root holding the Maven layout
    pub root: PathBuf,
    pub repository: Arc<ManagedRepository>,
    pub table: Arc<ContextTable>,
    pub executor: Arc<IndexingTaskExecutor>,
    pub calls: Arc<CallLog>,
}

impl TestRepository {
    /// Repository "internal" publishing to the default `.indexer` directory.
    pub fn new() -> Self {
        Self::build(|_, repository| repository)
    }

    /// Repository publishing to `<temp>/<dir_name>` instead.
    pub fn with_snapshot_dir(dir_name: &str) -> Self {
        Self::build(|temp, repository| {
            repository.with_index_directory(temp.join(dir_name).to_string_lossy().to_string())
        })
    }

    fn build(configure: impl FnOnce(&Path, ManagedRepository) -> ManagedRepository) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("repository");
        std::fs::create_dir_all(&root).expect("Failed to create repository root");

        let repository = Arc::new(configure(
            temp_dir.path(),
            ManagedRepository::new("internal", root.clone()),
        ));
        let table = Arc::new(ContextTable::new(
            ContextConfig::new(temp_dir.path().join("indexes")).with_memory_mb(15),
        ));
        let calls = Arc::new(CallLog::default());
        let executor = Arc::new(IndexingTaskExecutor::new(
            Arc::new(TantivyContextProvider::new(table.clone())),
            Arc::new(LayoutExtractor::new(table.clone())),
            Arc::new(RecordingEngine {
                inner: TantivyIndexEngine::new(table.clone()),
                log: calls.clone(),
            }),
            Arc::new(RecordingPublisher {
                inner: SnapshotPublisher::new(table.clone()),
                log: calls.clone(),
            }),
            ExecutorConfig::default(),
        ));

        Self {
            _temp_dir: temp_dir,
            root,
            repository,
            table,
            executor,
            calls,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Write a file under the repository root and return its relative path.
    pub fn write_artifact(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create artifact dir");
        }
        std::fs::write(&path, content).expect("Failed to write artifact");
        PathBuf::from(relative)
    }

    pub fn remove_artifact(&self, relative: &str) {
        std::fs::remove_file(self.root.join(relative)).expect("Failed to remove artifact");
    }

    /// Open (or reuse) the repository's context.
    pub fn open_context(&self) -> ContextId {
        TantivyContextProvider::new(self.table.clone())
            .create_context(&self.repository)
            .expect("Failed to open context")
    }

    pub fn execute(&self, task: IndexingTask) -> Result<TaskOutcome, TaskExecutionError> {
        self.executor.execute(task)
    }

    pub fn add(&self, relative: &str) -> Result<TaskOutcome, TaskExecutionError> {
        self.execute(IndexingTask::add(self.repository.clone(), relative, None))
    }

    pub fn delete(&self, relative: &str) -> Result<TaskOutcome, TaskExecutionError> {
        self.execute(IndexingTask::delete(self.repository.clone(), relative, None))
    }

    pub fn scan(&self, only_update: bool) -> Result<TaskOutcome, TaskExecutionError> {
        let context = self.open_context();
        self.execute(IndexingTask::scan(self.repository.clone(), context, only_update))
    }

    /// Committed records of the live index, sorted by identity.
    pub fn indexed_records(&self) -> Vec<ArtifactRecord> {
        let context = self
            .table
            .get(self.open_context())
            .expect("Failed to resolve context");
        ArtifactSearcher::new(&context)
            .all_records()
            .expect("Failed to read index")
    }

    /// Number of live entries with the descriptor's identity.
    pub fn entries_for(&self, descriptor: &ArtifactDescriptor) -> usize {
        let uinfo = descriptor.uinfo();
        self.indexed_records()
            .iter()
            .filter(|r| r.uinfo() == uinfo)
            .count()
    }

    /// The published snapshot.
    pub fn snapshot(&self) -> PackedSnapshot {
        read_snapshot(&self.repository.index_location()).expect("Failed to read snapshot")
    }

    /// Calls recorded since the last take.
    pub fn take_calls(&self) -> Vec<EngineCall> {
        self.calls.take()
    }
}

impl Default for TestRepository {
    fn default() -> Self {
        Self::new()
    }
}
