//! Task scope and lifecycle E2E tests.
//!
//! Covers which engine primitives each kind of task reaches, when the
//! finish sequence (optimize, pack, persist timestamp) runs, and the guard
//! against closed index contexts.

use std::path::PathBuf;

use pretty_assertions::assert_eq;

use artifact_indexing::{
    ErrorKind, IndexingTask, ResourceAction, TaskAction, TaskOutcome, TaskParts,
};
use artifact_types::{ContextId, ScanMode};
use e2e_tests::{lib_descriptor, EngineCall, TestRepository, LIB_JAR};

/// FINISH on the entire repository ignores any resource file it carries.
#[test]
fn test_repository_task_never_reads_resource_file() {
    let repo = TestRepository::new();
    repo.write_artifact(LIB_JAR, b"jar");
    let context = repo.open_context();

    let task = IndexingTask::from_parts(TaskParts {
        action: TaskAction::Finish,
        repository: repo.repository.clone(),
        context: Some(context),
        resource_file: Some(PathBuf::from("does/not/exist.jar")),
        execute_on_entire_repo: true,
        only_update: false,
    })
    .unwrap();

    let outcome = repo.execute(task).unwrap();
    match outcome {
        TaskOutcome::Scanned { stats, .. } => assert_eq!(stats.added, 1),
        other => panic!("expected a scan, got {:?}", other),
    }
    assert_eq!(
        repo.take_calls(),
        vec![
            EngineCall::Scan(ScanMode::Full),
            EngineCall::Optimize,
            EngineCall::Pack(repo.root.join(".indexer")),
        ]
    );
}

#[test]
fn test_resource_tasks_never_scan() {
    let repo = TestRepository::new();
    repo.write_artifact(LIB_JAR, b"jar");

    repo.add(LIB_JAR).unwrap();
    repo.delete(LIB_JAR).unwrap();
    repo.add("com/x/lib/1.0/lib-1.0.jar.sha1").unwrap();

    let calls = repo.take_calls();
    assert!(!calls.is_empty());
    assert!(calls.iter().all(|c| !matches!(c, EngineCall::Scan(_))));
}

#[test]
fn test_incremental_flag_selects_scan_mode() {
    let repo = TestRepository::new();
    repo.scan(true).unwrap();
    repo.scan(false).unwrap();

    let scans: Vec<EngineCall> = repo
        .take_calls()
        .into_iter()
        .filter(|c| matches!(c, EngineCall::Scan(_)))
        .collect();
    assert_eq!(
        scans,
        vec![
            EngineCall::Scan(ScanMode::Incremental),
            EngineCall::Scan(ScanMode::Full),
        ]
    );
}

#[test]
fn test_add_runs_exactly_one_finish() {
    let repo = TestRepository::new();
    repo.write_artifact(LIB_JAR, b"jar");
    repo.add(LIB_JAR).unwrap();

    let calls = repo.take_calls();
    let optimizes = calls.iter().filter(|c| **c == EngineCall::Optimize).count();
    let packs = calls
        .iter()
        .filter(|c| matches!(c, EngineCall::Pack(_)))
        .count();
    assert_eq!((optimizes, packs), (1, 1));
    assert!(repo.temp_path().join("indexes/internal/timestamp").exists());
}

/// ADD issued during a scan indexes the file but leaves publishing to the scan.
#[test]
fn test_add_during_scan_does_not_publish() {
    let repo = TestRepository::new();
    repo.write_artifact(LIB_JAR, b"jar");
    repo.scan(false).unwrap();
    repo.take_calls();

    let war = "com/x/app/2.0/app-2.0.war";
    repo.write_artifact(war, b"war");
    let context = repo.open_context();
    let outcome = repo
        .execute(IndexingTask::scan_entry(
            ResourceAction::Add,
            repo.repository.clone(),
            war,
            context,
        ))
        .unwrap();

    assert!(matches!(outcome, TaskOutcome::Added { replaced: false, .. }));
    assert_eq!(
        repo.take_calls(),
        vec![
            EngineCall::Search,
            EngineCall::Add("com.x|app|2.0|NA|war".to_string()),
        ]
    );
    assert_eq!(repo.indexed_records().len(), 2);
    assert_eq!(repo.snapshot().header.entries, 1);
}

#[test]
fn test_delete_during_scan_only_deletes() {
    let repo = TestRepository::new();
    repo.write_artifact(LIB_JAR, b"jar");
    repo.add(LIB_JAR).unwrap();
    repo.take_calls();

    let context = repo.open_context();
    let task = IndexingTask::from_parts(TaskParts {
        action: TaskAction::Delete,
        repository: repo.repository.clone(),
        context: Some(context),
        resource_file: Some(PathBuf::from(LIB_JAR)),
        execute_on_entire_repo: true,
        only_update: false,
    })
    .unwrap();
    repo.execute(task).unwrap();

    assert_eq!(
        repo.take_calls(),
        vec![EngineCall::Delete(lib_descriptor().uinfo())]
    );
    assert_eq!(repo.entries_for(&lib_descriptor()), 0);
}

/// DELETE of an artifact that was never indexed succeeds without finishing.
#[test]
fn test_delete_absent_artifact() {
    let repo = TestRepository::new();

    let outcome = repo.delete(LIB_JAR).unwrap();
    assert_eq!(
        outcome,
        TaskOutcome::Deleted {
            descriptor: lib_descriptor(),
        }
    );
    assert_eq!(
        repo.take_calls(),
        vec![EngineCall::Delete(lib_descriptor().uinfo())]
    );
    assert!(!repo.root.join(".indexer").exists());
}

/// DELETE leaves the published snapshot stale until the next finish.
#[test]
fn test_delete_does_not_republish() {
    let repo = TestRepository::new();
    repo.write_artifact(LIB_JAR, b"jar");
    repo.add(LIB_JAR).unwrap();

    repo.remove_artifact(LIB_JAR);
    repo.delete(LIB_JAR).unwrap();

    assert_eq!(repo.entries_for(&lib_descriptor()), 0);
    assert_eq!(repo.snapshot().header.entries, 1);

    repo.scan(true).unwrap();
    assert_eq!(repo.snapshot().header.entries, 0);
}

#[test]
fn test_closed_context_guard() {
    let repo = TestRepository::new();
    repo.write_artifact(LIB_JAR, b"jar");
    let context = repo.open_context();
    repo.table.close(context).unwrap();

    let add = repo.execute(IndexingTask::add(
        repo.repository.clone(),
        LIB_JAR,
        Some(context),
    ));
    let delete = repo.execute(IndexingTask::delete(
        repo.repository.clone(),
        LIB_JAR,
        Some(context),
    ));
    let scan = repo.execute(IndexingTask::scan(repo.repository.clone(), context, true));

    for result in [add, delete, scan] {
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ContextClosed);
        assert!(!err.is_retryable());
    }
    assert!(repo.take_calls().is_empty());
}

#[test]
fn test_unknown_context_is_rejected() {
    let repo = TestRepository::new();
    let err = repo
        .execute(IndexingTask::scan(
            repo.repository.clone(),
            ContextId::new(9_999),
            false,
        ))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ContextClosed);
    assert!(err.message.contains("internal"));
}

#[test]
fn test_not_an_artifact_changes_nothing() {
    let repo = TestRepository::new();
    repo.write_artifact("com/x/lib/maven-metadata.xml", b"<metadata/>");

    let outcome = repo.add("com/x/lib/maven-metadata.xml").unwrap();
    assert_eq!(outcome, TaskOutcome::NotAnArtifact);
    assert!(repo.take_calls().is_empty());
    assert!(repo.indexed_records().is_empty());
}

#[test]
fn test_invalid_coordinates_fail_extraction() {
    let repo = TestRepository::new();
    repo.write_artifact("com/x/lib/1.0/lib-2.0.jar", b"wrong version");

    let err = repo.add("com/x/lib/1.0/lib-2.0.jar").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Extraction);
    assert!(err.message.contains("com/x/lib/1.0/lib-2.0.jar"));
    assert!(repo.take_calls().is_empty());
}

#[test]
fn test_illegal_task_combinations() {
    let repo = TestRepository::new();
    let parts = |action, entire, context: Option<ContextId>, file: Option<&str>| TaskParts {
        action,
        repository: repo.repository.clone(),
        context,
        resource_file: file.map(PathBuf::from),
        execute_on_entire_repo: entire,
        only_update: true,
    };

    assert!(IndexingTask::from_parts(parts(TaskAction::Finish, true, None, None)).is_err());
    assert!(IndexingTask::from_parts(parts(TaskAction::Finish, false, None, Some(LIB_JAR))).is_err());
    assert!(IndexingTask::from_parts(parts(TaskAction::Add, false, None, None)).is_err());
    assert!(IndexingTask::from_parts(parts(TaskAction::Add, false, None, Some(LIB_JAR))).is_ok());
    assert!(IndexingTask::from_parts(parts(TaskAction::Add, true, None, Some(LIB_JAR))).is_err());

    let context = repo.open_context();
    assert!(
        IndexingTask::from_parts(parts(TaskAction::Add, true, Some(context), Some(LIB_JAR))).is_ok()
    );
}
