//! Repository scan mode and statistics.

use serde::{Deserialize, Serialize};

/// How a repository scan reconciles the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Clear the index and rebuild it from the repository contents
    Full,
    /// Add, update and remove only what changed since the last scan
    Incremental,
}

impl ScanMode {
    pub fn from_only_update(only_update: bool) -> Self {
        if only_update {
            ScanMode::Incremental
        } else {
            ScanMode::Full
        }
    }

    pub fn is_incremental(&self) -> bool {
        matches!(self, ScanMode::Incremental)
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Full => write!(f, "full"),
            ScanMode::Incremental => write!(f, "incremental"),
        }
    }
}

/// Counters reported by a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files visited under the repository root
    pub scanned_files: u64,
    /// New entries added
    pub added: u64,
    /// Existing entries replaced because the file changed
    pub updated: u64,
    /// Existing entries left untouched
    pub unchanged: u64,
    /// Entries removed because their file is gone
    pub removed: u64,
    /// Files that are not artifacts
    pub skipped: u64,
    /// Files with invalid coordinates
    pub errors: u64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of index entries written or deleted.
    pub fn changes(&self) -> u64 {
        self.added + self.updated + self.removed
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}
