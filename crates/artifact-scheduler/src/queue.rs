//! Indexing task queue and its single consumer.
//!
//! Producers (cron scans, the CLI) push tasks through an [`IndexingQueue`].
//! One [`IndexingWorker`] drains the queue in order and runs every task on
//! a blocking thread, so at most one task executes at a time.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use artifact_indexing::{
    ErrorKind, IndexingTask, IndexingTaskExecutor, TaskExecutionError, TaskOutcome,
};

use crate::{SchedulerError, WorkerConfig};

/// Sending half of the task queue. Cheap to clone.
#[derive(Clone)]
pub struct IndexingQueue {
    sender: mpsc::Sender<IndexingTask>,
}

impl IndexingQueue {
    /// Create a queue and the worker that consumes it.
    pub fn new(executor: Arc<IndexingTaskExecutor>, config: WorkerConfig) -> (Self, IndexingWorker) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let worker = IndexingWorker {
            receiver,
            executor,
            config,
        };
        (Self { sender }, worker)
    }

    /// Enqueue a task, waiting for room when the queue is full.
    pub async fn enqueue(&self, task: IndexingTask) -> Result<(), SchedulerError> {
        debug!(task = %task, "Enqueuing task");
        self.sender
            .send(task)
            .await
            .map_err(|_| SchedulerError::QueueClosed)
    }

    /// Enqueue without waiting.
    pub fn try_enqueue(&self, task: IndexingTask) -> Result<(), SchedulerError> {
        self.sender.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SchedulerError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SchedulerError::QueueClosed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Totals reported when a worker stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    /// Tasks that completed, including non-artifact resources
    pub succeeded: u64,
    /// Tasks that completed because the resource was not an artifact
    pub not_artifacts: u64,
    /// Tasks given up on
    pub failed: u64,
    /// Extra attempts made for retryable failures
    pub retries: u64,
}

impl WorkerSummary {
    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Single consumer of an [`IndexingQueue`].
pub struct IndexingWorker {
    receiver: mpsc::Receiver<IndexingTask>,
    executor: Arc<IndexingTaskExecutor>,
    config: WorkerConfig,
}

impl IndexingWorker {
    /// Process tasks until `cancel` fires or every queue handle is dropped.
    ///
    /// A task already running when `cancel` fires is completed; queued tasks
    /// that were not started are left behind.
    pub async fn run(mut self, cancel: CancellationToken) -> WorkerSummary {
        let mut summary = WorkerSummary::default();
        info!(max_attempts = self.config.max_attempts, "Indexing worker started");

        loop {
            let task = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Indexing worker cancelled");
                    break;
                }
                task = self.receiver.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            self.process(task, &cancel, &mut summary).await;
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            retries = summary.retries,
            "Indexing worker stopped"
        );
        summary
    }

    async fn process(
        &self,
        task: IndexingTask,
        cancel: &CancellationToken,
        summary: &mut WorkerSummary,
    ) {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.execute_blocking(task.clone()).await {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    if outcome == TaskOutcome::NotAnArtifact {
                        summary.not_artifacts += 1;
                    }
                    debug!(task = %task, outcome = ?outcome, "Task completed");
                    return;
                }
                Err(e) if e.is_retryable() && attempt < max_attempts && !cancel.is_cancelled() => {
                    warn!(
                        task = %task,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Retryable indexing failure"
                    );
                    summary.retries += 1;
                    attempt += 1;
                    tokio::time::sleep(self.config.retry_delay()).await;
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(task = %task, kind = %e.kind, attempts = attempt, error = %e, "Indexing task failed");
                    return;
                }
            }
        }
    }

    async fn execute_blocking(&self, task: IndexingTask) -> Result<TaskOutcome, TaskExecutionError> {
        let executor = self.executor.clone();
        let description = task.to_string();
        match tokio::task::spawn_blocking(move || executor.execute(task)).await {
            Ok(result) => result,
            // a panic leaves the index as it was; running it again panics again
            Err(join) => Err(TaskExecutionError::new(
                ErrorKind::Aborted,
                format!("{}: {}", join, description),
            )),
        }
    }
}
