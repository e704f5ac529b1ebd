//! Artifact Indexer
//!
//! Keeps repository search indexes current and publishes packed snapshots.
//!
//! # Usage
//!
//! ```bash
//! artifact-indexer add <REPOSITORY> <FILE>
//! artifact-indexer delete <REPOSITORY> <FILE>
//! artifact-indexer scan <REPOSITORY> [--only-update]
//! artifact-indexer inspect <REPOSITORY> [-n LIMIT]
//! artifact-indexer run [--scan-now]
//! artifact-indexer config
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/artifact-indexer/config.toml)
//! 3. Environment variables (INDEXER_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use artifact_daemon::{
    handle_add, handle_delete, handle_inspect, handle_scan, init_logging, load_settings,
    run_daemon, show_config, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        cli.index_root.as_deref(),
    )?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Add { repository, file } => {
            handle_add(&settings, &repository, &file)?;
        }
        Commands::Delete { repository, file } => {
            handle_delete(&settings, &repository, &file)?;
        }
        Commands::Scan {
            repository,
            only_update,
        } => {
            handle_scan(&settings, &repository, only_update)?;
        }
        Commands::Inspect { repository, limit } => {
            handle_inspect(&settings, &repository, limit)?;
        }
        Commands::Run { scan_now } => {
            let summary = run_daemon(&settings, scan_now).await?;
            println!(
                "Processed {} tasks ({} failed, {} retries)",
                summary.processed(),
                summary.failed,
                summary.retries
            );
        }
        Commands::Config => {
            show_config(&settings)?;
        }
    }

    Ok(())
}
