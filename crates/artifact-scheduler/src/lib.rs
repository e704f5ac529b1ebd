//! Queueing and scheduling of indexing tasks.
//!
//! Tasks reach the executor through an [`IndexingQueue`] drained by a single
//! [`IndexingWorker`]. Repository scans are fired on cron schedules by the
//! [`SchedulerService`], which uses `tokio-cron-scheduler` with timezone
//! support and graceful shutdown.
//!
//! # Example
//!
//! ```ignore
//! use artifact_scheduler::{register_repository_scan, IndexingQueue, ScanJobConfig, SchedulerService};
//!
//! let (queue, worker) = IndexingQueue::new(executor, WorkerConfig::default());
//! let scheduler = SchedulerService::new(SchedulerConfig::default()).await?;
//!
//! register_repository_scan(
//!     &scheduler,
//!     queue.clone(),
//!     provider,
//!     repository,
//!     ScanJobConfig::new("0 0 2 * * *"),
//! ).await?;
//!
//! scheduler.start().await?;
//! let summary = worker.run(scheduler.shutdown_token()).await;
//! ```

mod config;
mod error;
pub mod jobs;
mod queue;
mod scheduler;
#[cfg(test)]
mod testing;

pub use config::{SchedulerConfig, WorkerConfig};
pub use error::SchedulerError;
pub use jobs::{enqueue_repository_scan, register_repository_scan, ScanJobConfig};
pub use queue::{IndexingQueue, IndexingWorker, WorkerSummary};
pub use scheduler::{parse_timezone, validate_cron_expression, SchedulerService};
