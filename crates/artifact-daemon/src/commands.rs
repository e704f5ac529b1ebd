//! Command implementations for the artifact indexer.
//!
//! Handles:
//! - add / delete / scan: run one task directly on the executor
//! - inspect: read a published snapshot
//! - run: worker plus cron scans until Ctrl+C or SIGTERM
//! - config: print the effective settings

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use artifact_indexing::{
    tantivy_executor, ContextProvider, ExecutorConfig, IndexingTask, IndexingTaskExecutor,
    TantivyContextProvider, TaskOutcome,
};
use artifact_scheduler::{
    enqueue_repository_scan, register_repository_scan, IndexingQueue, ScanJobConfig,
    SchedulerConfig, SchedulerService, WorkerConfig, WorkerSummary,
};
use artifact_search::{read_snapshot, ContextConfig, ContextTable};
use artifact_types::{ArtifactError, ManagedRepository, Settings};

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    index_root_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(index_root) = index_root_override {
        settings.index_root = index_root.to_string();
    }
    Ok(settings)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Resolve a configured repository id, or a directory as an ad-hoc repository
/// named after it.
pub fn resolve_repository(settings: &Settings, name: &str) -> Result<ManagedRepository> {
    match settings.repository(name) {
        Ok(repository) => Ok(repository),
        Err(ArtifactError::RepositoryNotFound(_)) => {
            let path = Path::new(name);
            if !path.is_dir() {
                bail!(
                    "Unknown repository '{}': not a configured id or a directory",
                    name
                );
            }
            let location = path
                .canonicalize()
                .with_context(|| format!("Failed to resolve {}", name))?;
            let id = location
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("Cannot name repository at {:?}", location))?
                .to_string();
            Ok(ManagedRepository::new(id, location))
        }
        Err(e) => Err(e.into()),
    }
}

/// Context table and executor wired from settings.
pub struct IndexerStack {
    pub table: Arc<ContextTable>,
    pub executor: Arc<IndexingTaskExecutor>,
    pub provider: Arc<dyn ContextProvider>,
}

impl IndexerStack {
    pub fn new(settings: &Settings) -> Self {
        let table = Arc::new(ContextTable::new(
            ContextConfig::new(settings.expanded_index_root())
                .with_memory_mb(settings.writer_memory_mb),
        ));
        let executor = Arc::new(tantivy_executor(
            table.clone(),
            ExecutorConfig::default().with_search_limit(settings.search_limit),
        ));
        let provider: Arc<dyn ContextProvider> =
            Arc::new(TantivyContextProvider::new(table.clone()));
        Self {
            table,
            executor,
            provider,
        }
    }

    /// Commit and release every open context.
    pub fn close(&self) -> Result<()> {
        let closed = self
            .table
            .close_all()
            .context("Failed to close index contexts")?;
        info!(closed, "Closed index contexts");
        Ok(())
    }

    fn execute(&self, task: IndexingTask) -> Result<TaskOutcome> {
        let description = task.to_string();
        let result = self.executor.execute(task);
        self.close()?;
        result.with_context(|| format!("Failed to execute {}", description))
    }
}

fn report(outcome: &TaskOutcome) {
    match outcome {
        TaskOutcome::Added {
            descriptor,
            replaced,
        } => {
            let verb = if *replaced { "Replaced" } else { "Added" };
            println!("{} {}", verb, descriptor);
        }
        TaskOutcome::Deleted { descriptor } => println!("Deleted {}", descriptor),
        TaskOutcome::Scanned { stats, elapsed } => {
            println!(
                "Scanned {} files in {:.2}s: {} added, {} updated, {} unchanged, {} removed, {} skipped, {} invalid",
                stats.scanned_files,
                elapsed.as_secs_f64(),
                stats.added,
                stats.updated,
                stats.unchanged,
                stats.removed,
                stats.skipped,
                stats.errors
            );
        }
        TaskOutcome::NotAnArtifact => println!("Not an artifact, index unchanged"),
    }
}

pub fn handle_add(settings: &Settings, repository: &str, file: &Path) -> Result<TaskOutcome> {
    let repository = Arc::new(resolve_repository(settings, repository)?);
    let stack = IndexerStack::new(settings);
    let outcome = stack.execute(IndexingTask::add(repository, file, None))?;
    report(&outcome);
    Ok(outcome)
}

pub fn handle_delete(settings: &Settings, repository: &str, file: &Path) -> Result<TaskOutcome> {
    let repository = Arc::new(resolve_repository(settings, repository)?);
    let stack = IndexerStack::new(settings);
    let outcome = stack.execute(IndexingTask::delete(repository, file, None))?;
    report(&outcome);
    Ok(outcome)
}

pub fn handle_scan(settings: &Settings, repository: &str, only_update: bool) -> Result<TaskOutcome> {
    let repository = Arc::new(resolve_repository(settings, repository)?);
    let stack = IndexerStack::new(settings);
    let context = stack
        .provider
        .create_context(&repository)
        .map_err(|e| anyhow::anyhow!("Failed to open index for {}: {}", repository.id, e))?;
    let outcome = stack.execute(IndexingTask::scan(repository, context, only_update))?;
    report(&outcome);
    Ok(outcome)
}

pub fn handle_inspect(settings: &Settings, repository: &str, limit: usize) -> Result<()> {
    let repository = resolve_repository(settings, repository)?;
    let target = repository.index_location();
    let snapshot = read_snapshot(&target)
        .with_context(|| format!("No readable snapshot in {:?}", target))?;

    println!("Repository: {}", snapshot.header.repository_id);
    println!("Snapshot:   {:?}", target);
    println!("Created:    {}", snapshot.header.created_at.to_rfc3339());
    println!("Entries:    {}", snapshot.header.entries);

    for record in snapshot.records.iter().take(limit) {
        match record.size {
            Some(size) => println!("  {}  {} ({} bytes)", record.descriptor, record.file_name, size),
            None => println!("  {}  {}", record.descriptor, record.file_name),
        }
    }
    if snapshot.records.len() > limit {
        println!("  ... {} more", snapshot.records.len() - limit);
    }
    Ok(())
}

pub fn show_config(settings: &Settings) -> Result<()> {
    let text = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    print!("{}", text);
    Ok(())
}

/// Run the worker and cron scans until Ctrl+C or SIGTERM.
pub async fn run_daemon(settings: &Settings, scan_now: bool) -> Result<WorkerSummary> {
    run_until(settings, scan_now, shutdown_signal()).await
}

/// Run the worker and cron scans until `shutdown` completes.
///
/// The task running when shutdown begins is completed; queued tasks are
/// dropped. Every index context is committed and closed on the way out.
pub async fn run_until<F>(settings: &Settings, scan_now: bool, shutdown: F) -> Result<WorkerSummary>
where
    F: Future<Output = ()>,
{
    info!("Artifact indexer starting...");
    info!("  Index root: {:?}", settings.expanded_index_root());
    info!("  Repositories: {}", settings.repositories.len());

    let stack = IndexerStack::new(settings);
    let (queue, worker) =
        IndexingQueue::new(stack.executor.clone(), WorkerConfig::from_settings(settings));

    let mut scheduler = SchedulerService::new(SchedulerConfig::from_settings(settings))
        .await
        .context("Failed to create scheduler")?;

    for repo_settings in &settings.repositories {
        let Some(job) = ScanJobConfig::from_settings(repo_settings) else {
            continue;
        };
        register_repository_scan(
            &scheduler,
            queue.clone(),
            stack.provider.clone(),
            Arc::new(repo_settings.to_managed()),
            job,
        )
        .await
        .with_context(|| format!("Failed to schedule scans of {}", repo_settings.id))?;
    }
    if settings.repositories.is_empty() {
        warn!("No repositories configured, nothing will be scheduled");
    }

    let cancel = CancellationToken::new();
    let worker_handle = tokio::spawn(worker.run(cancel.clone()));

    if scan_now {
        for repo_settings in &settings.repositories {
            let repository = Arc::new(repo_settings.to_managed());
            if let Err(e) = enqueue_repository_scan(
                &queue,
                stack.provider.clone(),
                repository,
                repo_settings.only_update,
            )
            .await
            {
                warn!(repository = %repo_settings.id, error = %e, "Startup scan not enqueued");
            }
        }
    }

    scheduler.start().await.context("Failed to start scheduler")?;

    shutdown.await;

    scheduler
        .shutdown()
        .await
        .context("Failed to stop scheduler")?;
    cancel.cancel();
    drop(queue);

    let summary = worker_handle.await.context("Indexing worker panicked")?;
    tokio::task::spawn_blocking(move || stack.close())
        .await
        .context("Closing index contexts panicked")??;

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Artifact indexer stopped"
    );
    Ok(summary)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
