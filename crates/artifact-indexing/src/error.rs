//! Error types for task execution.

use std::fmt;

use thiserror::Error;

use crate::task::TaskError;

/// Boxed error returned by collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What went wrong while executing a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The task's fields form an illegal combination
    InvalidTask,
    /// The context provider could not create a context
    ContextCreation,
    /// The task's context has been closed
    ContextClosed,
    /// The resource file has malformed artifact coordinates
    Extraction,
    /// Search, add, delete or timestamp update failed
    IndexIo,
    /// The repository scan failed
    ScanIo,
    /// Optimizing the index failed
    OptimizeIo,
    /// Packing the snapshot failed
    PublishIo,
    /// The task stopped without returning, e.g. it panicked
    Aborted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidTask => "invalid task",
            ErrorKind::ContextCreation => "context creation",
            ErrorKind::ContextClosed => "context closed",
            ErrorKind::Extraction => "extraction",
            ErrorKind::IndexIo => "index I/O",
            ErrorKind::ScanIo => "scan I/O",
            ErrorKind::OptimizeIo => "optimize I/O",
            ErrorKind::PublishIo => "publish I/O",
            ErrorKind::Aborted => "aborted",
        }
    }

    /// Whether running the same task again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::IndexIo | ErrorKind::ScanIo | ErrorKind::OptimizeIo | ErrorKind::PublishIo
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single task, carrying the original cause.
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct TaskExecutionError {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl TaskExecutionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<TaskError> for TaskExecutionError {
    fn from(err: TaskError) -> Self {
        TaskExecutionError::new(ErrorKind::InvalidTask, err.to_string()).with_source(err)
    }
}
