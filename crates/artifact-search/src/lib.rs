//! # artifact-search
//!
//! Tantivy-backed index engine for repository artifacts.
//!
//! This crate owns everything that touches the live index of a repository:
//! contexts and the table that hands them out, exact-match lookups, staged
//! writes and optimize, repository scans, and packed snapshots.
//!
//! ## Features
//! - Embedded Tantivy index per repository with MmapDirectory persistence
//! - Raw STRING fields for exact coordinate matches
//! - Maven-2 layout extraction of artifact coordinates
//! - Full and incremental repository scans
//! - Atomically published gzip JSON-lines snapshots

pub mod context;
pub mod document;
pub mod error;
pub mod extractor;
pub mod index;
pub mod indexer;
pub mod packer;
pub mod scanner;
pub mod schema;
pub mod searcher;

pub use context::{ContextConfig, ContextTable, IndexContext};
pub use document::{doc_to_record, record_to_doc};
pub use error::SearchError;
pub use extractor::extract_artifact;
pub use index::{live_index_path, LiveIndex, DEFAULT_WRITER_MEMORY_MB, TIMESTAMP_FILE};
pub use indexer::ArtifactIndexer;
pub use packer::{
    pack_index, read_snapshot, PackSummary, PackedSnapshot, SnapshotHeader, PROPERTIES_FILE,
    SNAPSHOT_FILE, SNAPSHOT_FORMAT_VERSION,
};
pub use scanner::scan_repository;
pub use schema::{build_artifact_schema, ArtifactSchema};
pub use searcher::ArtifactSearcher;
