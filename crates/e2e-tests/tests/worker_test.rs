//! Queue and worker E2E tests over the real index.
//!
//! Tasks submitted through the queue are executed one at a time in the
//! order they were enqueued.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use artifact_indexing::{IndexingTask, TantivyContextProvider};
use artifact_scheduler::{enqueue_repository_scan, IndexingQueue, WorkerConfig};
use e2e_tests::{lib_descriptor, EngineCall, TestRepository, LIB_JAR};

#[tokio::test]
async fn test_add_then_delete_in_order() {
    let repo = TestRepository::new();
    repo.write_artifact(LIB_JAR, b"jar");
    repo.write_artifact("com/x/app/2.0/app-2.0.war", b"war");
    let (queue, worker) = IndexingQueue::new(repo.executor.clone(), WorkerConfig::default());

    queue
        .enqueue(IndexingTask::add(repo.repository.clone(), LIB_JAR, None))
        .await
        .unwrap();
    queue
        .enqueue(IndexingTask::add(
            repo.repository.clone(),
            "com/x/app/2.0/app-2.0.war",
            None,
        ))
        .await
        .unwrap();
    queue
        .enqueue(IndexingTask::delete(repo.repository.clone(), LIB_JAR, None))
        .await
        .unwrap();
    drop(queue);

    let summary = worker.run(CancellationToken::new()).await;
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);

    let mutations: Vec<EngineCall> = repo
        .take_calls()
        .into_iter()
        .filter(|c| matches!(c, EngineCall::Add(_) | EngineCall::Delete(_)))
        .collect();
    assert_eq!(
        mutations,
        vec![
            EngineCall::Add(lib_descriptor().uinfo()),
            EngineCall::Add("com.x|app|2.0|NA|war".to_string()),
            EngineCall::Delete(lib_descriptor().uinfo()),
        ]
    );
    assert_eq!(repo.entries_for(&lib_descriptor()), 0);
    assert_eq!(repo.indexed_records().len(), 1);
}

#[tokio::test]
async fn test_failed_task_does_not_stop_worker() {
    let repo = TestRepository::new();
    repo.write_artifact("com/x/lib/1.0/lib-2.0.jar", b"bad coordinates");
    repo.write_artifact(LIB_JAR, b"jar");
    let config = WorkerConfig::default()
        .with_max_attempts(3)
        .with_retry_delay_ms(1);
    let (queue, worker) = IndexingQueue::new(repo.executor.clone(), config);

    queue
        .enqueue(IndexingTask::add(
            repo.repository.clone(),
            "com/x/lib/1.0/lib-2.0.jar",
            None,
        ))
        .await
        .unwrap();
    queue
        .enqueue(IndexingTask::add(repo.repository.clone(), LIB_JAR, None))
        .await
        .unwrap();
    drop(queue);

    let summary = worker.run(CancellationToken::new()).await;
    assert_eq!(summary.failed, 1);
    // extraction failures are not retryable
    assert_eq!(summary.retries, 0);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(repo.snapshot().header.entries, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_enqueued_scan_publishes_snapshot() {
    let repo = TestRepository::new();
    repo.write_artifact(LIB_JAR, b"jar");
    repo.write_artifact("com/x/lib/1.1/lib-1.1.jar", b"jar 1.1");
    let (queue, worker) = IndexingQueue::new(repo.executor.clone(), WorkerConfig::default());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(worker.run(cancel.clone()));

    let provider = std::sync::Arc::new(TantivyContextProvider::new(repo.table.clone()));
    enqueue_repository_scan(&queue, provider, repo.repository.clone(), false)
        .await
        .unwrap();
    drop(queue);

    let summary = tokio::time::timeout(Duration::from_secs(30), handle)
        .await
        .expect("worker did not finish")
        .unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(repo.snapshot().header.entries, 2);
}
