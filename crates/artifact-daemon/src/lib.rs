//! Artifact indexer library exports.
//!
//! This crate provides the `artifact-indexer` binary.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (add, delete, scan, inspect, run, config)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    handle_add, handle_delete, handle_inspect, handle_scan, init_logging, load_settings,
    resolve_repository, run_daemon, run_until, show_config, IndexerStack,
};
