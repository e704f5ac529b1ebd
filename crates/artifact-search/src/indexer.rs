//! Write operations on a context's live index.
//!
//! Changes are staged in the context's writer and become visible on
//! `commit()`, which also reloads the reader.

use tantivy::indexer::NoMergePolicy;
use tantivy::Term;
use tracing::{debug, info};

use artifact_types::ArtifactRecord;

use crate::context::IndexContext;
use crate::document::record_to_doc;
use crate::error::SearchError;

/// Stages additions and deletions against one index context.
pub struct ArtifactIndexer<'a> {
    ctx: &'a IndexContext,
}

impl<'a> ArtifactIndexer<'a> {
    pub fn new(ctx: &'a IndexContext) -> Self {
        Self { ctx }
    }

    /// Stage a record. Existing entries with the same identity are kept;
    /// callers delete them first when replacing.
    pub fn add(&self, record: &ArtifactRecord) -> Result<(), SearchError> {
        let doc = record_to_doc(self.ctx.schema(), record);
        self.ctx.with_writer(|writer| {
            writer.add_document(doc)?;
            Ok(())
        })?;
        debug!(uinfo = %record.uinfo(), "Staged artifact entry");
        Ok(())
    }

    /// Stage deletion of every entry with this identity key.
    pub fn delete(&self, uinfo: &str) -> Result<(), SearchError> {
        let term = Term::from_field_text(self.ctx.schema().uinfo, uinfo);
        self.ctx.with_writer(|writer| {
            writer.delete_term(term);
            Ok(())
        })?;
        debug!(uinfo, "Staged artifact deletion");
        Ok(())
    }

    /// Stage removal of every entry.
    pub fn delete_all(&self) -> Result<(), SearchError> {
        self.ctx.with_writer(|writer| {
            writer.delete_all_documents()?;
            Ok(())
        })?;
        debug!(context = %self.ctx.id(), "Staged removal of all entries");
        Ok(())
    }

    /// Commit staged changes and make them searchable.
    pub fn commit(&self) -> Result<u64, SearchError> {
        let opstamp = self.ctx.with_writer(|writer| Ok(writer.commit()?))?;
        self.ctx.reload()?;
        debug!(context = %self.ctx.id(), opstamp, "Committed index");
        Ok(opstamp)
    }

    /// Discard everything staged since the last commit.
    pub fn rollback(&self) -> Result<(), SearchError> {
        self.ctx.with_writer(|writer| {
            writer.rollback()?;
            // rollback rebuilds the writer with the default policy
            writer.set_merge_policy(Box::new(NoMergePolicy));
            Ok(())
        })?;
        debug!(context = %self.ctx.id(), "Rolled back staged changes");
        Ok(())
    }

    /// Commit, merge all searchable segments into one and drop unused files.
    pub fn optimize(&self) -> Result<(), SearchError> {
        let index = self.ctx.live_index().index().clone();
        let merged = self.ctx.with_writer(|writer| {
            writer.commit()?;
            let segments = index.searchable_segment_ids()?;
            let merged = segments.len();
            if merged > 1 {
                writer.merge(&segments).wait()?;
            }
            writer.garbage_collect_files().wait()?;
            Ok(merged)
        })?;
        self.ctx.reload()?;

        info!(
            context = %self.ctx.id(),
            repository = %self.ctx.repository_id(),
            segments = merged,
            "Optimized index"
        );
        Ok(())
    }
}
