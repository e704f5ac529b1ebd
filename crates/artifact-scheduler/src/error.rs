//! Error types for the scheduler crate.
//!
//! Covers cron expression validation, timezone parsing, scheduler
//! lifecycle and the indexing queue.

use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

/// Errors that can occur during scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Error from the underlying tokio-cron-scheduler
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Invalid cron expression
    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),

    /// Invalid timezone string
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Scheduler is already running
    #[error("Scheduler is already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("Scheduler is not running")]
    NotRunning,

    /// The worker has stopped and no longer accepts tasks
    #[error("Indexing queue is closed")]
    QueueClosed,

    /// The queue is at capacity
    #[error("Indexing queue is full")]
    QueueFull,

    /// No index context could be opened for a scheduled scan
    #[error("Cannot open index context: {0}")]
    Context(String),
}

impl From<JobSchedulerError> for SchedulerError {
    fn from(err: JobSchedulerError) -> Self {
        SchedulerError::Scheduler(err.to_string())
    }
}
