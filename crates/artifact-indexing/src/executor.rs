//! The indexing task executor.
//!
//! Applies one task at a time to a repository's index: single-file adds and
//! deletes, whole-repository scans, and the optimize/pack/timestamp sequence
//! that publishes a fresh snapshot after a scan or a standalone add. Adds
//! issued on behalf of a running scan leave publishing to the scan.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use artifact_types::{
    ArtifactDescriptor, ArtifactField, ArtifactQuery, ArtifactRecord, ContextId,
    ManagedRepository, ScanMode, ScanStats,
};

use crate::collaborators::{ContextProvider, DescriptorExtractor, IndexEngine, IndexPublisher};
use crate::error::{BoxError, ErrorKind, TaskExecutionError};
use crate::task::{IndexingTask, RepositoryTask, ResourceAction};

/// Default maximum hits for the duplicate search.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum hits for the duplicate search before an add
    pub search_limit: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl ExecutorConfig {
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }
}

/// Result of a successful task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The repository was scanned and a snapshot published
    Scanned { stats: ScanStats, elapsed: Duration },
    /// The artifact was indexed; a snapshot is published unless the add was
    /// part of a scan. `replaced` is true when the duplicate search found
    /// existing entries.
    Added {
        descriptor: ArtifactDescriptor,
        replaced: bool,
    },
    /// Entries with the artifact's identity were removed
    Deleted { descriptor: ArtifactDescriptor },
    /// The resource file is not an artifact; nothing was changed
    NotAnArtifact,
}

/// Exact-match query for entries that would duplicate `descriptor`.
///
/// Group, artifact and version are always required; classifier and
/// packaging only when the descriptor has them.
pub fn duplicate_query(descriptor: &ArtifactDescriptor) -> ArtifactQuery {
    let mut query = ArtifactQuery::new()
        .must(ArtifactField::GroupId, &descriptor.group_id)
        .must(ArtifactField::ArtifactId, &descriptor.artifact_id)
        .must(ArtifactField::Version, &descriptor.version);
    if let Some(classifier) = &descriptor.classifier {
        query = query.must(ArtifactField::Classifier, classifier);
    }
    if let Some(packaging) = &descriptor.packaging {
        query = query.must(ArtifactField::Packaging, packaging);
    }
    query
}

/// Single-consumer, run-to-completion task executor.
///
/// The executor holds no per-task state; callers serialize calls to
/// [`execute`](Self::execute).
pub struct IndexingTaskExecutor {
    provider: Arc<dyn ContextProvider>,
    extractor: Arc<dyn DescriptorExtractor>,
    engine: Arc<dyn IndexEngine>,
    publisher: Arc<dyn IndexPublisher>,
    config: ExecutorConfig,
}

impl IndexingTaskExecutor {
    pub fn new(
        provider: Arc<dyn ContextProvider>,
        extractor: Arc<dyn DescriptorExtractor>,
        engine: Arc<dyn IndexEngine>,
        publisher: Arc<dyn IndexPublisher>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            extractor,
            engine,
            publisher,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run one task to completion.
    pub fn execute(&self, task: IndexingTask) -> Result<TaskOutcome, TaskExecutionError> {
        debug!(task = %task, "Executing indexing task");
        match &task {
            IndexingTask::Repository(repository_task) => {
                self.execute_repository(&task, repository_task)
            }
            IndexingTask::Resource(resource_task) => {
                let ctx = match resource_task.context {
                    Some(ctx) => ctx,
                    None => self
                        .provider
                        .create_context(&resource_task.repository)
                        .map_err(|e| {
                            fail(ErrorKind::ContextCreation, &task, "cannot create context", e)
                        })?,
                };
                self.execute_resource(
                    &task,
                    resource_task.action,
                    &resource_task.repository,
                    ctx,
                    &resource_task.resource_file,
                    true,
                )
            }
            IndexingTask::ScanEntry(entry) => self.execute_resource(
                &task,
                entry.action,
                &entry.repository,
                entry.context,
                &entry.resource_file,
                false,
            ),
        }
    }

    fn execute_repository(
        &self,
        task: &IndexingTask,
        repository_task: &RepositoryTask,
    ) -> Result<TaskOutcome, TaskExecutionError> {
        let ctx = repository_task.context;
        self.ensure_open(task, ctx)?;

        let mode = ScanMode::from_only_update(repository_task.only_update);
        let start = Instant::now();
        let stats = self
            .engine
            .scan(ctx, mode)
            .map_err(|e| fail(ErrorKind::ScanIo, task, "repository scan failed", e))?;
        let elapsed = start.elapsed();

        info!(
            repository = %repository_task.repository.id,
            only_update = repository_task.only_update,
            elapsed_ms = elapsed.as_millis() as u64,
            added = stats.added,
            updated = stats.updated,
            removed = stats.removed,
            errors = stats.errors,
            "Indexed repository"
        );

        self.finish(task, ctx, &repository_task.repository)?;
        Ok(TaskOutcome::Scanned { stats, elapsed })
    }

    /// Extract the file and apply `action`. Only a standalone add publishes.
    fn execute_resource(
        &self,
        task: &IndexingTask,
        action: ResourceAction,
        repository: &ManagedRepository,
        ctx: ContextId,
        resource_file: &Path,
        publish: bool,
    ) -> Result<TaskOutcome, TaskExecutionError> {
        self.ensure_open(task, ctx)?;

        let record = match self
            .extractor
            .extract(ctx, resource_file)
            .map_err(|e| fail(ErrorKind::Extraction, task, "cannot read artifact coordinates", e))?
        {
            Some(record) => record,
            None => {
                debug!(task = %task, "Resource is not an artifact");
                return Ok(TaskOutcome::NotAnArtifact);
            }
        };

        match action {
            ResourceAction::Add => {
                let replaced = self.add_without_duplicates(task, ctx, &record)?;
                self.provider
                    .update_timestamp(ctx, false)
                    .map_err(|e| fail(ErrorKind::IndexIo, task, "timestamp update failed", e))?;
                if publish {
                    self.finish(task, ctx, repository)?;
                }

                info!(
                    repository = %repository.id,
                    artifact = %record.descriptor,
                    replaced,
                    published = publish,
                    "Indexed artifact"
                );
                Ok(TaskOutcome::Added {
                    descriptor: record.descriptor,
                    replaced,
                })
            }
            ResourceAction::Delete => {
                self.engine
                    .delete_entry(ctx, &record.descriptor)
                    .map_err(|e| fail(ErrorKind::IndexIo, task, "delete failed", e))?;

                info!(
                    repository = %repository.id,
                    artifact = %record.descriptor,
                    "Removed artifact from index"
                );
                Ok(TaskOutcome::Deleted {
                    descriptor: record.descriptor,
                })
            }
        }
    }

    /// Search for entries that would duplicate the record, clear them, then add.
    fn add_without_duplicates(
        &self,
        task: &IndexingTask,
        ctx: ContextId,
        record: &ArtifactRecord,
    ) -> Result<bool, TaskExecutionError> {
        let query = duplicate_query(&record.descriptor);
        let hits = self
            .engine
            .search(ctx, &query, self.config.search_limit)
            .map_err(|e| fail(ErrorKind::IndexIo, task, "duplicate search failed", e))?;

        let replaced = !hits.is_empty();
        if replaced {
            debug!(query = %query, hits = hits.len(), "Replacing existing entries");
            self.engine
                .delete_entry(ctx, &record.descriptor)
                .map_err(|e| fail(ErrorKind::IndexIo, task, "delete before add failed", e))?;
        }

        self.engine
            .add_entry(ctx, record)
            .map_err(|e| fail(ErrorKind::IndexIo, task, "add failed", e))?;
        Ok(replaced)
    }

    /// Optimize, pack into the repository's index location, persist the timestamp.
    fn finish(
        &self,
        task: &IndexingTask,
        ctx: ContextId,
        repository: &ManagedRepository,
    ) -> Result<PathBuf, TaskExecutionError> {
        self.engine
            .optimize(ctx)
            .map_err(|e| fail(ErrorKind::OptimizeIo, task, "optimize failed", e))?;

        let location = repository.index_location();
        self.publisher
            .pack(ctx, &location)
            .map_err(|e| fail(ErrorKind::PublishIo, task, "pack failed", e))?;

        self.provider
            .update_timestamp(ctx, true)
            .map_err(|e| fail(ErrorKind::IndexIo, task, "timestamp update failed", e))?;

        debug!(path = %location.display(), "index packaged at {}", location.display());
        Ok(location)
    }

    fn ensure_open(&self, task: &IndexingTask, ctx: ContextId) -> Result<(), TaskExecutionError> {
        if self.provider.index_directory(ctx).is_none() {
            return Err(TaskExecutionError::new(
                ErrorKind::ContextClosed,
                format!("index context {} already closed: {}", ctx, task),
            ));
        }
        Ok(())
    }
}

fn fail(kind: ErrorKind, task: &IndexingTask, what: &str, source: BoxError) -> TaskExecutionError {
    TaskExecutionError::new(kind, format!("{}: {}", what, task)).with_source(source)
}
