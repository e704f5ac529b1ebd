//! Indexing tasks.
//!
//! A task either touches one resource file (ADD / DELETE) or covers the
//! whole repository (FINISH, which scans and publishes). A resource task
//! issued on behalf of a running scan is a third shape: it reuses the
//! scan's context and leaves publishing to the scan. Each shape is its own
//! variant so a repository task always carries a context and a resource
//! task always carries a file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use artifact_types::{ContextId, ManagedRepository};

/// Logical action of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskAction {
    Add,
    Delete,
    Finish,
}

impl TaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Add => "ADD",
            TaskAction::Delete => "DELETE",
            TaskAction::Finish => "FINISH",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action applicable to a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAction {
    Add,
    Delete,
}

impl ResourceAction {
    pub fn task_action(&self) -> TaskAction {
        match self {
            ResourceAction::Add => TaskAction::Add,
            ResourceAction::Delete => TaskAction::Delete,
        }
    }
}

/// Add or delete the index entry for one file.
#[derive(Debug, Clone)]
pub struct ResourceTask {
    pub action: ResourceAction,
    pub repository: Arc<ManagedRepository>,
    /// Context to work in; one is created when absent
    pub context: Option<ContextId>,
    pub resource_file: PathBuf,
}

/// Add or delete one file while a scan of its repository is in progress.
///
/// Works in the scan's context and never publishes a snapshot.
#[derive(Debug, Clone)]
pub struct ScanEntryTask {
    pub action: ResourceAction,
    pub repository: Arc<ManagedRepository>,
    pub context: ContextId,
    pub resource_file: PathBuf,
}

/// Scan the whole repository, then optimize and publish.
#[derive(Debug, Clone)]
pub struct RepositoryTask {
    pub repository: Arc<ManagedRepository>,
    pub context: ContextId,
    /// Incremental scan when true, full rebuild otherwise
    pub only_update: bool,
}

/// A unit of work for the executor.
#[derive(Debug, Clone)]
pub enum IndexingTask {
    Resource(ResourceTask),
    ScanEntry(ScanEntryTask),
    Repository(RepositoryTask),
}

/// Loosely typed task fields, as carried by queue messages and the CLI.
#[derive(Debug, Clone)]
pub struct TaskParts {
    pub action: TaskAction,
    pub repository: Arc<ManagedRepository>,
    pub context: Option<ContextId>,
    pub resource_file: Option<PathBuf>,
    pub execute_on_entire_repo: bool,
    pub only_update: bool,
}

/// Illegal combination of task fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task for repository {repository} has no resource file")]
    MissingResourceFile { repository: String },

    #[error("repository task for {repository} has no index context")]
    MissingContext { repository: String },

    #[error("{action} is not supported with execute_on_entire_repo = {entire_repo}")]
    UnsupportedCombination {
        action: TaskAction,
        entire_repo: bool,
    },
}

impl IndexingTask {
    pub fn add(
        repository: Arc<ManagedRepository>,
        resource_file: impl Into<PathBuf>,
        context: Option<ContextId>,
    ) -> Self {
        IndexingTask::Resource(ResourceTask {
            action: ResourceAction::Add,
            repository,
            context,
            resource_file: resource_file.into(),
        })
    }

    pub fn delete(
        repository: Arc<ManagedRepository>,
        resource_file: impl Into<PathBuf>,
        context: Option<ContextId>,
    ) -> Self {
        IndexingTask::Resource(ResourceTask {
            action: ResourceAction::Delete,
            repository,
            context,
            resource_file: resource_file.into(),
        })
    }

    pub fn scan(repository: Arc<ManagedRepository>, context: ContextId, only_update: bool) -> Self {
        IndexingTask::Repository(RepositoryTask {
            repository,
            context,
            only_update,
        })
    }

    /// A single-file task that belongs to a running scan.
    pub fn scan_entry(
        action: ResourceAction,
        repository: Arc<ManagedRepository>,
        resource_file: impl Into<PathBuf>,
        context: ContextId,
    ) -> Self {
        IndexingTask::ScanEntry(ScanEntryTask {
            action,
            repository,
            context,
            resource_file: resource_file.into(),
        })
    }

    /// Validate loosely typed fields and build the matching variant.
    pub fn from_parts(parts: TaskParts) -> Result<Self, TaskError> {
        let TaskParts {
            action,
            repository,
            context,
            resource_file,
            execute_on_entire_repo,
            only_update,
        } = parts;

        if !execute_on_entire_repo && resource_file.is_none() {
            return Err(TaskError::MissingResourceFile {
                repository: repository.id.clone(),
            });
        }

        let missing_context = |id: &str| TaskError::MissingContext {
            repository: id.to_string(),
        };
        let missing_file = |id: &str| TaskError::MissingResourceFile {
            repository: id.to_string(),
        };

        let resource_action = match action {
            TaskAction::Add => ResourceAction::Add,
            TaskAction::Delete => ResourceAction::Delete,
            TaskAction::Finish if execute_on_entire_repo => {
                let context = context.ok_or_else(|| missing_context(&repository.id))?;
                return Ok(IndexingTask::scan(repository, context, only_update));
            }
            TaskAction::Finish => {
                return Err(TaskError::UnsupportedCombination {
                    action,
                    entire_repo: false,
                })
            }
        };

        let resource_file = resource_file.ok_or_else(|| missing_file(&repository.id))?;
        if execute_on_entire_repo {
            let context = context.ok_or_else(|| missing_context(&repository.id))?;
            return Ok(IndexingTask::scan_entry(
                resource_action,
                repository,
                resource_file,
                context,
            ));
        }
        Ok(IndexingTask::Resource(ResourceTask {
            action: resource_action,
            repository,
            context,
            resource_file,
        }))
    }

    pub fn action(&self) -> TaskAction {
        match self {
            IndexingTask::Resource(task) => task.action.task_action(),
            IndexingTask::ScanEntry(task) => task.action.task_action(),
            IndexingTask::Repository(_) => TaskAction::Finish,
        }
    }

    pub fn execute_on_entire_repo(&self) -> bool {
        !matches!(self, IndexingTask::Resource(_))
    }

    /// Only meaningful for repository tasks; false otherwise.
    pub fn only_update(&self) -> bool {
        match self {
            IndexingTask::Resource(_) | IndexingTask::ScanEntry(_) => false,
            IndexingTask::Repository(task) => task.only_update,
        }
    }

    pub fn resource_file(&self) -> Option<&Path> {
        match self {
            IndexingTask::Resource(task) => Some(&task.resource_file),
            IndexingTask::ScanEntry(task) => Some(&task.resource_file),
            IndexingTask::Repository(_) => None,
        }
    }

    pub fn context(&self) -> Option<ContextId> {
        match self {
            IndexingTask::Resource(task) => task.context,
            IndexingTask::ScanEntry(task) => Some(task.context),
            IndexingTask::Repository(task) => Some(task.context),
        }
    }

    pub fn repository(&self) -> &Arc<ManagedRepository> {
        match self {
            IndexingTask::Resource(task) => &task.repository,
            IndexingTask::ScanEntry(task) => &task.repository,
            IndexingTask::Repository(task) => &task.repository,
        }
    }

    /// Back to loosely typed fields.
    pub fn to_parts(&self) -> TaskParts {
        TaskParts {
            action: self.action(),
            repository: Arc::clone(self.repository()),
            context: self.context(),
            resource_file: self.resource_file().map(Path::to_path_buf),
            execute_on_entire_repo: self.execute_on_entire_repo(),
            only_update: self.only_update(),
        }
    }
}

impl fmt::Display for IndexingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexingTask::Resource(task) => write!(
                f,
                "{} {} in repository {}",
                task.action.task_action(),
                task.resource_file.display(),
                task.repository.id
            ),
            IndexingTask::ScanEntry(task) => write!(
                f,
                "{} {} in repository {} during scan ({})",
                task.action.task_action(),
                task.resource_file.display(),
                task.repository.id,
                task.context
            ),
            IndexingTask::Repository(task) => write!(
                f,
                "FINISH repository {} ({} scan, {})",
                task.repository.id,
                if task.only_update { "incremental" } else { "full" },
                task.context
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> Arc<ManagedRepository> {
        Arc::new(ManagedRepository::new("internal", "/srv/repo"))
    }

    fn parts(action: TaskAction, entire_repo: bool) -> TaskParts {
        TaskParts {
            action,
            repository: repository(),
            context: None,
            resource_file: None,
            execute_on_entire_repo: entire_repo,
            only_update: false,
        }
    }

    #[test]
    fn test_resource_task_from_parts() {
        let task = IndexingTask::from_parts(TaskParts {
            resource_file: Some("com/x/lib/1.0/lib-1.0.jar".into()),
            ..parts(TaskAction::Add, false)
        })
        .unwrap();

        assert_eq!(task.action(), TaskAction::Add);
        assert!(!task.execute_on_entire_repo());
        assert_eq!(
            task.resource_file(),
            Some(Path::new("com/x/lib/1.0/lib-1.0.jar"))
        );
        assert_eq!(task.context(), None);
    }

    #[test]
    fn test_repository_task_from_parts() {
        let task = IndexingTask::from_parts(TaskParts {
            context: Some(ContextId::new(3)),
            only_update: true,
            ..parts(TaskAction::Finish, true)
        })
        .unwrap();

        assert_eq!(task.action(), TaskAction::Finish);
        assert!(task.execute_on_entire_repo());
        assert!(task.only_update());
        assert_eq!(task.resource_file(), None);
        assert_eq!(task.context(), Some(ContextId::new(3)));
    }

    #[test]
    fn test_missing_resource_file() {
        let err = IndexingTask::from_parts(parts(TaskAction::Delete, false)).unwrap_err();
        assert!(matches!(err, TaskError::MissingResourceFile { .. }));
    }

    #[test]
    fn test_finish_without_context() {
        let err = IndexingTask::from_parts(parts(TaskAction::Finish, true)).unwrap_err();
        assert_eq!(
            err,
            TaskError::MissingContext {
                repository: "internal".into()
            }
        );
    }

    #[test]
    fn test_unsupported_combinations() {
        let err = IndexingTask::from_parts(TaskParts {
            resource_file: Some("a.jar".into()),
            ..parts(TaskAction::Finish, false)
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "FINISH is not supported with execute_on_entire_repo = false"
        );
    }

    #[test]
    fn test_scan_entry_from_parts() {
        let task = IndexingTask::from_parts(TaskParts {
            context: Some(ContextId::new(1)),
            resource_file: Some("com/x/lib/1.0/lib-1.0.jar".into()),
            ..parts(TaskAction::Add, true)
        })
        .unwrap();

        assert!(matches!(
            task,
            IndexingTask::ScanEntry(ScanEntryTask {
                action: ResourceAction::Add,
                ..
            })
        ));
        assert_eq!(task.action(), TaskAction::Add);
        assert!(task.execute_on_entire_repo());
        assert_eq!(task.context(), Some(ContextId::new(1)));
        assert_eq!(
            task.resource_file(),
            Some(Path::new("com/x/lib/1.0/lib-1.0.jar"))
        );
    }

    #[test]
    fn test_scan_entry_needs_context_and_file() {
        let err = IndexingTask::from_parts(TaskParts {
            resource_file: Some("com/x/lib/1.0/lib-1.0.jar".into()),
            ..parts(TaskAction::Delete, true)
        })
        .unwrap_err();
        assert!(matches!(err, TaskError::MissingContext { .. }));

        let err = IndexingTask::from_parts(TaskParts {
            context: Some(ContextId::new(1)),
            ..parts(TaskAction::Add, true)
        })
        .unwrap_err();
        assert!(matches!(err, TaskError::MissingResourceFile { .. }));
    }

    #[test]
    fn test_parts_roundtrip() {
        let tasks = [
            IndexingTask::delete(repository(), "com/x/lib/1.0/lib-1.0.jar", Some(ContextId::new(2))),
            IndexingTask::scan_entry(
                ResourceAction::Add,
                repository(),
                "com/x/lib/1.0/lib-1.0.jar",
                ContextId::new(2),
            ),
        ];
        for task in tasks {
            let rebuilt = IndexingTask::from_parts(task.to_parts()).unwrap();
            assert_eq!(rebuilt.to_string(), task.to_string());
        }
    }

    #[test]
    fn test_display() {
        let task = IndexingTask::add(repository(), "com/x/lib/1.0/lib-1.0.jar", None);
        assert_eq!(
            task.to_string(),
            "ADD com/x/lib/1.0/lib-1.0.jar in repository internal"
        );

        let task = IndexingTask::scan(repository(), ContextId::new(7), true);
        assert_eq!(
            task.to_string(),
            "FINISH repository internal (incremental scan, ctx-7)"
        );

        let task = IndexingTask::scan_entry(
            ResourceAction::Delete,
            repository(),
            "com/x/lib/1.0/lib-1.0.jar",
            ContextId::new(7),
        );
        assert_eq!(
            task.to_string(),
            "DELETE com/x/lib/1.0/lib-1.0.jar in repository internal during scan (ctx-7)"
        );
    }

    #[test]
    fn test_action_serde() {
        let json = serde_json::to_string(&TaskAction::Finish).unwrap();
        assert_eq!(json, "\"FINISH\"");
    }
}
