//! Index maintenance for artifact repositories.
//!
//! This crate executes indexing tasks against a repository's search index:
//! adding and deleting single artifacts without ever leaving duplicate
//! entries, scanning whole repositories, and publishing a packed snapshot
//! after each scan or add.
//!
//! ## Key Components
//!
//! - [`IndexingTask`]: A unit of work, either one resource or the whole repository
//! - [`IndexingTaskExecutor`]: Runs one task to completion
//! - [`ContextProvider`], [`DescriptorExtractor`], [`IndexEngine`], [`IndexPublisher`]:
//!   Collaborators injected into the executor
//! - [`TaskExecutionError`]: Failure with an [`ErrorKind`] and the original cause
//! - [`tantivy_adapters`]: Collaborators backed by `artifact-search`
//!
//! ## Example
//!
//! ```ignore
//! use artifact_indexing::{tantivy_executor, ExecutorConfig, IndexingTask};
//!
//! let executor = tantivy_executor(table.clone(), ExecutorConfig::default());
//! let outcome = executor.execute(IndexingTask::add(repository, "com/x/lib/1.0/lib-1.0.jar", None))?;
//! ```

pub mod collaborators;
pub mod error;
pub mod executor;
pub mod tantivy_adapters;
pub mod task;

pub use collaborators::{ContextProvider, DescriptorExtractor, IndexEngine, IndexPublisher};
pub use error::{BoxError, ErrorKind, TaskExecutionError};
pub use executor::{
    duplicate_query, ExecutorConfig, IndexingTaskExecutor, TaskOutcome, DEFAULT_SEARCH_LIMIT,
};
pub use tantivy_adapters::{
    tantivy_executor, LayoutExtractor, SnapshotPublisher, TantivyContextProvider,
    TantivyIndexEngine,
};
pub use task::{
    IndexingTask, RepositoryTask, ResourceAction, ResourceTask, ScanEntryTask, TaskAction, TaskError,
    TaskParts,
};
