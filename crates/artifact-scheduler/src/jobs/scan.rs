//! Scheduled repository scans.
//!
//! Each run opens (or reuses) the repository's index context and pushes a
//! repository task onto the indexing queue. The scan itself runs later on
//! the worker, in order with every other task.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use artifact_indexing::{ContextProvider, IndexingTask};
use artifact_types::{ContextId, ManagedRepository, RepositorySettings};

use crate::{IndexingQueue, SchedulerError, SchedulerService};

/// Schedule of one repository's scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanJobConfig {
    /// Cron expression (6-field)
    pub cron: String,

    /// Timezone override; the scheduler default applies when unset
    #[serde(default)]
    pub timezone: Option<String>,

    /// Incremental scans when true, full rebuilds otherwise
    #[serde(default = "default_only_update")]
    pub only_update: bool,
}

fn default_only_update() -> bool {
    true
}

impl ScanJobConfig {
    pub fn new(cron: impl Into<String>) -> Self {
        Self {
            cron: cron.into(),
            timezone: None,
            only_update: true,
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_only_update(mut self, only_update: bool) -> Self {
        self.only_update = only_update;
        self
    }

    /// Schedule declared for a configured repository, if any.
    pub fn from_settings(settings: &RepositorySettings) -> Option<Self> {
        settings
            .scan_cron
            .as_ref()
            .map(|cron| Self::new(cron.clone()).with_only_update(settings.only_update))
    }
}

/// Open the repository's context and enqueue a scan of it.
pub async fn enqueue_repository_scan(
    queue: &IndexingQueue,
    provider: Arc<dyn ContextProvider>,
    repository: Arc<ManagedRepository>,
    only_update: bool,
) -> Result<ContextId, SchedulerError> {
    let target = repository.clone();
    let context = tokio::task::spawn_blocking(move || provider.create_context(&target))
        .await
        .map_err(|e| SchedulerError::Context(format!("{}: {}", repository.id, e)))?
        .map_err(|e| SchedulerError::Context(format!("{}: {}", repository.id, e)))?;

    queue
        .enqueue(IndexingTask::scan(repository, context, only_update))
        .await?;
    Ok(context)
}

/// Register a cron job that scans `repository`.
pub async fn register_repository_scan(
    scheduler: &SchedulerService,
    queue: IndexingQueue,
    provider: Arc<dyn ContextProvider>,
    repository: Arc<ManagedRepository>,
    config: ScanJobConfig,
) -> Result<uuid::Uuid, SchedulerError> {
    let repository_id = repository.id.clone();
    let only_update = config.only_update;

    scheduler
        .add_scan_job(&repository_id, &config, move || {
            let queue = queue.clone();
            let provider = provider.clone();
            let repository = repository.clone();
            async move {
                let id = repository.id.clone();
                match enqueue_repository_scan(&queue, provider, repository, only_update).await {
                    Ok(context) => {
                        info!(repository = %id, context = %context, only_update, "Scan enqueued")
                    }
                    Err(e) => warn!(repository = %id, error = %e, "Scheduled scan not enqueued"),
                }
            }
        })
        .await
}
