//! # artifact-types
//!
//! Shared domain types for the artifact indexer.
//!
//! This crate defines the data structures passed between the index engine,
//! the task executor and the scheduler:
//! - Artifact descriptors and records: the natural key of an indexed artifact
//! - Managed repositories: where artifacts live and where snapshots are published
//! - Exact-match queries over descriptor fields
//! - Scan modes and statistics
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use artifact_types::ArtifactDescriptor;
//!
//! let descriptor = ArtifactDescriptor::new("com.x", "lib", "1.0");
//! assert_eq!(descriptor.uinfo(), "com.x|lib|1.0|NA|NA");
//! ```

pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod query;
pub mod repository;
pub mod scan;

pub use config::{RepositorySettings, Settings};
pub use context::ContextId;
pub use descriptor::{ArtifactDescriptor, ArtifactRecord, NOT_AVAILABLE};
pub use error::ArtifactError;
pub use query::{ArtifactField, ArtifactQuery, FieldMatch};
pub use repository::{ManagedRepository, DEFAULT_INDEX_DIRECTORY};
pub use scan::{ScanMode, ScanStats};
