//! Configuration loading for the artifact indexer.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/artifact-indexer/config.toml.

use std::collections::HashSet;
use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::repository::ManagedRepository;

/// Smallest writer budget Tantivy accepts for a single indexing thread.
const MIN_WRITER_MEMORY_MB: usize = 15;

/// A repository declared in the settings file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositorySettings {
    /// Repository identifier
    pub id: String,

    /// Root directory of the repository (may start with ~/)
    pub location: String,

    /// Custom directory for packed snapshots (default: <location>/.indexer)
    #[serde(default)]
    pub index_directory: Option<String>,

    /// Cron expression for scheduled scans (6-field). No scheduled scan when unset.
    #[serde(default)]
    pub scan_cron: Option<String>,

    /// Whether scheduled scans are incremental
    #[serde(default = "default_true")]
    pub only_update: bool,
}

fn default_true() -> bool {
    true
}

impl RepositorySettings {
    pub fn new(id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            index_directory: None,
            scan_cron: None,
            only_update: true,
        }
    }

    /// Resolve into a managed repository, expanding ~ in paths.
    pub fn to_managed(&self) -> ManagedRepository {
        let location = PathBuf::from(shellexpand::tilde(&self.location).as_ref());
        let mut repository = ManagedRepository::new(self.id.clone(), location);
        if let Some(dir) = &self.index_directory {
            repository = repository.with_index_directory(shellexpand::tilde(dir).to_string());
        }
        repository
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the live index of every repository
    #[serde(default = "default_index_root")]
    pub index_root: String,

    /// Memory budget for index writers in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Maximum hits for the duplicate-detection search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Capacity of the indexing task queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Attempts per task for retryable failures (1 = no retry)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// IANA timezone for scheduled scans
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Repositories to index
    #[serde(default)]
    pub repositories: Vec<RepositorySettings>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_index_root() -> String {
    ProjectDirs::from("", "", "artifact-indexer")
        .map(|p| p.data_local_dir().join("indexes"))
        .unwrap_or_else(|| PathBuf::from("./indexes"))
        .to_string_lossy()
        .to_string()
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_search_limit() -> usize {
    50
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            index_root: default_index_root(),
            writer_memory_mb: default_writer_memory_mb(),
            search_limit: default_search_limit(),
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timezone: default_timezone(),
            repositories: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/artifact-indexer/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (INDEXER_*, nested keys separated by __)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ArtifactError> {
        let config_dir = ProjectDirs::from("", "", "artifact-indexer")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(|e| ArtifactError::Config(e.to_string()))?
            .set_default("index_root", default_index_root())
            .map_err(|e| ArtifactError::Config(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| ArtifactError::Config(e.to_string()))?
            .set_default("search_limit", default_search_limit() as i64)
            .map_err(|e| ArtifactError::Config(e.to_string()))?
            .set_default("queue_capacity", default_queue_capacity() as i64)
            .map_err(|e| ArtifactError::Config(e.to_string()))?
            .set_default("max_attempts", default_max_attempts() as i64)
            .map_err(|e| ArtifactError::Config(e.to_string()))?
            .set_default("retry_delay_ms", default_retry_delay_ms() as i64)
            .map_err(|e| ArtifactError::Config(e.to_string()))?
            .set_default("timezone", default_timezone())
            .map_err(|e| ArtifactError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // INDEXER_LOG_LEVEL, INDEXER_INDEX_ROOT, INDEXER_SEARCH_LIMIT, ...
        builder = builder.add_source(
            Environment::with_prefix("INDEXER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ArtifactError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ArtifactError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate value ranges and repository ids.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.writer_memory_mb < MIN_WRITER_MEMORY_MB {
            return Err(ArtifactError::Config(format!(
                "writer_memory_mb must be >= {}, got {}",
                MIN_WRITER_MEMORY_MB, self.writer_memory_mb
            )));
        }
        if self.search_limit == 0 {
            return Err(ArtifactError::Config("search_limit must be > 0".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ArtifactError::Config("queue_capacity must be > 0".into()));
        }
        if self.max_attempts == 0 {
            return Err(ArtifactError::Config("max_attempts must be >= 1".into()));
        }

        let mut seen = HashSet::new();
        for repo in &self.repositories {
            if repo.id.trim().is_empty() {
                return Err(ArtifactError::Config("repository id must not be blank".into()));
            }
            if !seen.insert(repo.id.as_str()) {
                return Err(ArtifactError::Config(format!(
                    "duplicate repository id: {}",
                    repo.id
                )));
            }
        }
        Ok(())
    }

    /// Look up a configured repository by id.
    pub fn repository(&self, id: &str) -> Result<ManagedRepository, ArtifactError> {
        self.repositories
            .iter()
            .find(|r| r.id == id)
            .map(RepositorySettings::to_managed)
            .ok_or_else(|| ArtifactError::RepositoryNotFound(id.to_string()))
    }

    /// Expand ~ in index_root to the home directory.
    pub fn expanded_index_root(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.index_root).as_ref())
    }
}
