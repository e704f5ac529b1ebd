//! Exact-match lookups over a context's live index.
//!
//! Each query clause becomes a term query on a raw STRING field; clauses are
//! combined with `Occur::Must`. No scoring is involved beyond Tantivy's
//! default ordering of the collected hits.

use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{TantivyDocument, Term};
use tracing::{debug, warn};

use artifact_types::{ArtifactQuery, ArtifactRecord};

use crate::context::IndexContext;
use crate::document::doc_to_record;
use crate::error::SearchError;
use crate::schema::ArtifactSchema;

/// Read-side access to one index context.
pub struct ArtifactSearcher<'a> {
    ctx: &'a IndexContext,
}

impl<'a> ArtifactSearcher<'a> {
    pub fn new(ctx: &'a IndexContext) -> Self {
        Self { ctx }
    }

    /// Return up to `limit` records matching every clause of `query`.
    ///
    /// An empty query matches nothing.
    pub fn search(
        &self,
        query: &ArtifactQuery,
        limit: usize,
    ) -> Result<Vec<ArtifactRecord>, SearchError> {
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let schema = self.ctx.schema();
        let tantivy_query = build_query(schema, query);
        let searcher = self.ctx.searcher()?;
        let top_docs = searcher.search(&tantivy_query, &TopDocs::with_limit(limit))?;

        let mut records = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            match doc_to_record(schema, &doc) {
                Some(record) => records.push(record),
                None => warn!(?address, "Skipping entry without coordinates"),
            }
        }

        debug!(query = %query, hits = records.len(), "Searched artifact index");
        Ok(records)
    }

    /// Every stored record, sorted by identity key.
    pub fn all_records(&self) -> Result<Vec<ArtifactRecord>, SearchError> {
        let schema = self.ctx.schema();
        let searcher = self.ctx.searcher()?;
        let addresses = searcher.search(&AllQuery, &DocSetCollector)?;

        let mut records = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(record) = doc_to_record(schema, &doc) {
                records.push(record);
            }
        }
        records.sort_by_key(|r| r.uinfo());
        Ok(records)
    }

    /// Number of live (non-deleted) entries.
    pub fn count(&self) -> Result<u64, SearchError> {
        Ok(self.ctx.searcher()?.num_docs())
    }
}

fn build_query(schema: &ArtifactSchema, query: &ArtifactQuery) -> BooleanQuery {
    let clauses: Vec<(Occur, Box<dyn Query>)> = query
        .clauses()
        .iter()
        .map(|clause| {
            let term = Term::from_field_text(schema.field_for(clause.field), &clause.value);
            let term_query: Box<dyn Query> =
                Box::new(TermQuery::new(term, IndexRecordOption::Basic));
            (Occur::Must, term_query)
        })
        .collect();
    BooleanQuery::new(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextConfig, ContextTable};
    use crate::indexer::ArtifactIndexer;
    use artifact_types::{ArtifactDescriptor, ArtifactField, ManagedRepository};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn populated_context(dir: &TempDir) -> Arc<IndexContext> {
        let table = ContextTable::new(ContextConfig::new(dir.path().join("idx")).with_memory_mb(15));
        let repo = ManagedRepository::new("internal", dir.path().join("repo"));
        let ctx = table.get(table.open_for(&repo).unwrap()).unwrap();

        let indexer = ArtifactIndexer::new(&ctx);
        let entries = [
            ArtifactDescriptor::new("com.x", "lib", "1.0").with_packaging("jar"),
            ArtifactDescriptor::new("com.x", "lib", "1.0")
                .with_classifier("sources")
                .with_packaging("jar"),
            ArtifactDescriptor::new("com.x", "lib", "1.0").with_packaging("pom"),
            ArtifactDescriptor::new("com.x", "lib", "2.0").with_packaging("jar"),
            ArtifactDescriptor::new("org.y", "lib", "1.0").with_packaging("jar"),
        ];
        for descriptor in entries {
            indexer
                .add(&ArtifactRecord::new(descriptor, "file"))
                .unwrap();
        }
        indexer.commit().unwrap();
        ctx
    }

    fn gav(group: &str, artifact: &str, version: &str) -> ArtifactQuery {
        ArtifactQuery::new()
            .must(ArtifactField::GroupId, group)
            .must(ArtifactField::ArtifactId, artifact)
            .must(ArtifactField::Version, version)
    }

    #[test]
    fn test_search_by_coordinates() {
        let dir = TempDir::new().unwrap();
        let ctx = populated_context(&dir);
        let searcher = ArtifactSearcher::new(&ctx);

        let hits = searcher.search(&gav("com.x", "lib", "1.0"), 50).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_search_with_classifier_and_packaging() {
        let dir = TempDir::new().unwrap();
        let ctx = populated_context(&dir);
        let searcher = ArtifactSearcher::new(&ctx);

        let query = gav("com.x", "lib", "1.0")
            .must(ArtifactField::Classifier, "sources")
            .must(ArtifactField::Packaging, "jar");
        let hits = searcher.search(&query, 50).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].descriptor.classifier.as_deref(), Some("sources"));
    }

    #[test]
    fn test_search_respects_limit() {
        let dir = TempDir::new().unwrap();
        let ctx = populated_context(&dir);
        let searcher = ArtifactSearcher::new(&ctx);

        let hits = searcher.search(&gav("com.x", "lib", "1.0"), 2).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let dir = TempDir::new().unwrap();
        let ctx = populated_context(&dir);
        let hits = ArtifactSearcher::new(&ctx)
            .search(&ArtifactQuery::new(), 50)
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_group_is_not_tokenized() {
        let dir = TempDir::new().unwrap();
        let ctx = populated_context(&dir);
        let query = ArtifactQuery::new().must(ArtifactField::GroupId, "com");
        let hits = ArtifactSearcher::new(&ctx).search(&query, 50).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_all_records_sorted() {
        let dir = TempDir::new().unwrap();
        let ctx = populated_context(&dir);
        let searcher = ArtifactSearcher::new(&ctx);

        let records = searcher.all_records().unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(searcher.count().unwrap(), 5);

        let keys: Vec<String> = records.iter().map(|r| r.uinfo()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
