//! Cron triggers for repository scans on tokio-cron-scheduler.
//!
//! A trigger only hands work to the indexing queue, so runs are short.
//! Shutdown still waits for any in flight, up to the grace period.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono_tz::Tz;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::jobs::ScanJobConfig;
use crate::{SchedulerConfig, SchedulerError};

/// Validate a 6-field cron expression (seconds first).
///
/// ```
/// use artifact_scheduler::validate_cron_expression;
///
/// assert!(validate_cron_expression("0 0 2 * * *").is_ok());
/// assert!(validate_cron_expression("every night").is_err());
/// ```
pub fn validate_cron_expression(expr: &str) -> Result<(), SchedulerError> {
    Job::new_async(expr, |_uuid, _lock| Box::pin(async {}))
        .map(|_| ())
        .map_err(|e| SchedulerError::InvalidCron(format!("'{}': {}", expr, e)))
}

/// Parse an IANA timezone identifier.
pub fn parse_timezone(tz_str: &str) -> Result<Tz, SchedulerError> {
    tz_str
        .parse()
        .map_err(|_| SchedulerError::InvalidTimezone(tz_str.to_string()))
}

/// Fires the scan triggers of every scheduled repository.
pub struct SchedulerService {
    scheduler: JobScheduler,
    config: SchedulerConfig,
    shutdown_token: CancellationToken,
    tracker: TaskTracker,
    is_running: AtomicBool,
}

impl SchedulerService {
    /// Create a stopped scheduler. The default timezone is validated here.
    pub async fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.parse_timezone()?;

        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            config,
            shutdown_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            is_running: AtomicBool::new(false),
        })
    }

    pub async fn start(&self) -> Result<(), SchedulerError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.scheduler.start().await?;
        info!("Scheduler started");
        Ok(())
    }

    /// Stop firing and wait up to `shutdown_timeout_secs` for running triggers.
    pub async fn shutdown(&mut self) -> Result<(), SchedulerError> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Err(SchedulerError::NotRunning);
        }

        info!("Initiating scheduler shutdown");
        self.shutdown_token.cancel();

        if let Err(e) = self.scheduler.shutdown().await {
            warn!("Error during scheduler shutdown: {}", e);
        }

        self.tracker.close();
        let grace = Duration::from_secs(self.config.shutdown_timeout_secs);
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(
                running = self.tracker.len(),
                "Scan triggers still running after shutdown grace period"
            );
        }

        self.is_running.store(false, Ordering::SeqCst);
        info!("Scheduler shutdown complete");
        Ok(())
    }

    /// Token cancelled when shutdown begins.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Run `trigger` for `repository_id` on the schedule in `scan`.
    ///
    /// The schedule's timezone overrides the configured default. Triggers
    /// that fire after shutdown has begun are skipped.
    pub async fn add_scan_job<F, Fut>(
        &self,
        repository_id: &str,
        scan: &ScanJobConfig,
        trigger: F,
    ) -> Result<uuid::Uuid, SchedulerError>
    where
        F: Fn() -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let tz = match scan.timezone.as_deref() {
            Some(tz_str) => parse_timezone(tz_str)?,
            None => self.config.parse_timezone()?,
        };
        validate_cron_expression(&scan.cron)?;

        let repository = repository_id.to_string();
        let shutdown_token = self.shutdown_token.clone();
        let tracker = self.tracker.clone();

        let job = Job::new_async_tz(scan.cron.as_str(), tz, move |_uuid, _lock| {
            let repository = repository.clone();
            let token = shutdown_token.clone();
            let tracker = tracker.clone();
            let trigger = trigger.clone();

            Box::pin(async move {
                if token.is_cancelled() {
                    debug!(repository = %repository, "Skipping scan trigger, shutdown in progress");
                    return;
                }
                tracker.track_future(trigger()).await;
            })
        })
        .map_err(|e| SchedulerError::InvalidCron(e.to_string()))?;

        let uuid = self.scheduler.add(job).await?;
        info!(
            repository = %repository_id,
            uuid = %uuid,
            cron = %scan.cron,
            timezone = %tz.name(),
            only_update = scan.only_update,
            "Scan scheduled"
        );
        Ok(uuid)
    }
}
