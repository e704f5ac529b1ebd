//! Scheduler and worker configuration.
//!
//! Provides configuration for the scheduler service (timezone, shutdown
//! grace period) and for the indexing worker (queue size, retries).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use artifact_types::Settings;

use crate::SchedulerError;

/// Configuration for the scheduler service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Default timezone for jobs (IANA timezone string, e.g., "America/New_York").
    /// Defaults to "UTC".
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// Seconds jobs are given to finish after the shutdown token fires.
    /// Defaults to 5 seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_shutdown_timeout() -> u64 {
    5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            default_timezone: settings.timezone.clone(),
            ..Default::default()
        }
    }

    /// Parse the configured timezone string into a chrono_tz::Tz.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidTimezone` if the timezone string
    /// is not a valid IANA timezone identifier.
    pub fn parse_timezone(&self) -> Result<chrono_tz::Tz, SchedulerError> {
        self.default_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| SchedulerError::InvalidTimezone(self.default_timezone.clone()))
    }
}

/// Configuration for the indexing queue and its worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Tasks the queue holds before `enqueue` waits
    pub queue_capacity: usize,

    /// Attempts per task when the failure is retryable (1 = no retry)
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_attempts: 1,
            retry_delay_ms: 500,
        }
    }
}

impl WorkerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            queue_capacity: settings.queue_capacity,
            max_attempts: settings.max_attempts,
            retry_delay_ms: settings.retry_delay_ms,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
