//! Managed repository descriptor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Snapshot directory name under the repository root when none is configured.
pub const DEFAULT_INDEX_DIRECTORY: &str = ".indexer";

/// A repository whose artifacts are indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedRepository {
    /// Repository identifier, unique per indexer
    pub id: String,
    /// Root directory of the repository contents
    pub location: PathBuf,
    /// Custom output directory for packed snapshots
    #[serde(default)]
    pub index_directory: Option<String>,
}

impl ManagedRepository {
    pub fn new(id: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            index_directory: None,
        }
    }

    pub fn with_index_directory(mut self, dir: impl Into<String>) -> Self {
        self.index_directory = Some(dir.into());
        self
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Directory that receives packed snapshots.
    ///
    /// A blank or whitespace-only `index_directory` counts as unset.
    pub fn index_location(&self) -> PathBuf {
        match self.index_directory.as_deref() {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => self.location.join(DEFAULT_INDEX_DIRECTORY),
        }
    }
}

impl std::fmt::Display for ManagedRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.location.display())
    }
}
