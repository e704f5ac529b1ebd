//! A repository's live index on disk.
//!
//! Every repository gets `<index_root>/<repository id>/`, holding the Tantivy
//! segment files and a `timestamp` file with the time of the last publish.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tantivy::indexer::NoMergePolicy;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info, warn};

use crate::error::SearchError;
use crate::schema::{build_artifact_schema, ArtifactSchema};

/// Default writer memory budget per repository (50MB)
pub const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Name of the file holding the last persisted timestamp.
pub const TIMESTAMP_FILE: &str = "timestamp";

const META_FILE: &str = "meta.json";

/// Live index directory of `repository_id` under `index_root`.
pub fn live_index_path(index_root: &Path, repository_id: &str) -> PathBuf {
    index_root.join(repository_id)
}

/// The Tantivy index backing one repository.
pub struct LiveIndex {
    index: Index,
    schema: ArtifactSchema,
    path: PathBuf,
    writer_memory_mb: usize,
}

impl LiveIndex {
    /// Open the live index of `repository_id`, creating it on first use.
    ///
    /// An existing directory must carry the artifact fields; anything else
    /// fails with `SchemaMismatch` rather than being overwritten.
    pub fn open(
        index_root: &Path,
        repository_id: &str,
        writer_memory_mb: usize,
    ) -> Result<Self, SearchError> {
        let path = live_index_path(index_root, repository_id);
        let index = if path.join(META_FILE).exists() {
            debug!(repository = repository_id, path = ?path, "Opening live index");
            Index::open_in_dir(&path)?
        } else {
            info!(repository = repository_id, path = ?path, "Creating live index");
            std::fs::create_dir_all(&path)?;
            Index::create_in_dir(&path, build_artifact_schema().schema().clone())?
        };
        let schema = ArtifactSchema::from_schema(index.schema())?;

        Ok(Self {
            index,
            schema,
            path,
            writer_memory_mb,
        })
    }

    pub fn schema(&self) -> &ArtifactSchema {
        &self.schema
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writer that never merges on its own; segments are merged by optimize.
    pub fn writer(&self) -> Result<IndexWriter, SearchError> {
        let writer: IndexWriter = self.index.writer(self.writer_memory_mb * 1024 * 1024)?;
        writer.set_merge_policy(Box::new(NoMergePolicy));
        debug!(path = ?self.path, memory_mb = self.writer_memory_mb, "Created index writer");
        Ok(writer)
    }

    /// Reader that sees a commit only after an explicit reload.
    pub fn reader(&self) -> Result<IndexReader, SearchError> {
        Ok(self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?)
    }

    /// Last persisted timestamp. An unreadable file counts as none.
    pub fn read_timestamp(&self) -> Option<DateTime<Utc>> {
        let text = std::fs::read_to_string(self.path.join(TIMESTAMP_FILE)).ok()?;
        match DateTime::parse_from_rfc3339(text.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Ignoring unreadable index timestamp");
                None
            }
        }
    }

    pub fn write_timestamp(&self, timestamp: DateTime<Utc>) -> Result<(), SearchError> {
        std::fs::write(self.path.join(TIMESTAMP_FILE), timestamp.to_rfc3339())?;
        Ok(())
    }
}
