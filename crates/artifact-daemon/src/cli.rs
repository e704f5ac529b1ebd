//! CLI argument parsing for the artifact indexer.
//!
//! CLI flags override every other configuration source.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Artifact Indexer
///
/// Keeps the search index of artifact repositories in step with their
/// contents and publishes packed snapshots of it.
#[derive(Parser, Debug)]
#[command(name = "artifact-indexer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/artifact-indexer/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override the directory holding live indexes
    #[arg(long, global = true)]
    pub index_root: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Indexer commands
///
/// `REPOSITORY` is a configured repository id or a repository directory.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index one artifact, replacing any existing entry for it
    Add {
        repository: String,

        /// Artifact path, relative to the repository root
        file: PathBuf,
    },

    /// Remove one artifact from the index
    Delete {
        repository: String,

        /// Artifact path, relative to the repository root
        file: PathBuf,
    },

    /// Scan a whole repository and publish its snapshot
    Scan {
        repository: String,

        /// Only index what changed instead of rebuilding
        #[arg(long)]
        only_update: bool,
    },

    /// Show the published snapshot of a repository
    Inspect {
        repository: String,

        /// Maximum records to print
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Run the indexing worker and scheduled scans until interrupted
    Run {
        /// Enqueue a scan of every configured repository at startup
        #[arg(long)]
        scan_now: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}
