//! End-to-end pipeline tests: submit through the service, drive the job to a
//! terminal state with the worker side, observe results through the service.

use std::sync::Arc;
use std::time::Duration;

use backend::config::worker::WorkerSettings;
use backend::entities::jobs::JobStatus;
use backend::infra::state::spawn_memory_worker;
use backend::queue::{MemoryQueue, QueueClient};
use backend::services::jobs::JobsService;
use backend::state::app_state::AppState;
use backend::state::security_config::SecurityConfig;
use backend::store::{Job, JobStore, JobUpdate, MemoryJobStore};
use backend::worker::{Processor, SimulatedExecutor, Worker};
use backend::AppError;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn pipeline() -> (Arc<MemoryJobStore>, Arc<MemoryQueue>, JobsService, Processor) {
    let store = Arc::new(MemoryJobStore::new());
    let queue = Arc::new(MemoryQueue::new());
    let service = JobsService::new(store.clone(), queue.clone());
    let processor = Processor::new(store.clone(), queue.clone(), Arc::new(SimulatedExecutor));
    (store, queue, service, processor)
}

async fn wait_for_terminal(store: &MemoryJobStore, job_id: Uuid) -> Job {
    for _ in 0..200 {
        if let Some(job) = store.find_by_id(job_id).await.unwrap() {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job did not reach a terminal status in time");
}

#[tokio::test]
async fn submitted_job_runs_to_succeeded() {
    let (_store, queue, service, processor) = pipeline();

    let job = service
        .submit("owner-1", json!({"task": "compact"}))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    let delivery = queue
        .dequeue(Duration::from_millis(50))
        .await
        .unwrap()
        .expect("submission should be deliverable");
    processor.process(&delivery).await.unwrap();

    let done = service.get("owner-1", job.id).await.unwrap();
    assert_eq!(done.status, JobStatus::Succeeded);
    assert_eq!(done.result.unwrap()["message"], "Job completed successfully");
    assert!(done.error.is_none());

    // Acked, so nothing is left to deliver.
    assert!(queue
        .dequeue(Duration::from_millis(10))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn failing_job_records_its_error_and_stays_owner_scoped() {
    let (_store, queue, service, processor) = pipeline();

    let job = service
        .submit("owner-1", json!({"fail": "boom"}))
        .await
        .unwrap();
    let delivery = queue
        .dequeue(Duration::from_millis(50))
        .await
        .unwrap()
        .unwrap();
    processor.process(&delivery).await.unwrap();

    let failed = service.get("owner-1", job.id).await.unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("boom"));
    assert!(failed.result.is_none());

    // The failure is invisible to anyone but its owner.
    let err = service.get("owner-2", job.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn worker_drives_submissions_to_terminal_states() {
    let store = Arc::new(MemoryJobStore::new());
    let queue = Arc::new(MemoryQueue::new());
    let service = JobsService::new(store.clone(), queue.clone());
    let worker = Arc::new(Worker::new(
        store.clone(),
        queue.clone(),
        Arc::new(SimulatedExecutor),
        WorkerSettings {
            stale_timeout: Duration::from_secs(600),
            concurrency: 2,
        },
    ));

    let token = CancellationToken::new();
    let run = tokio::spawn({
        let worker = worker.clone();
        let token = token.clone();
        async move { worker.run(token).await }
    });

    let ok = service.submit("owner", json!({})).await.unwrap();
    let bad = service
        .submit("owner", json!({"fail": "broken"}))
        .await
        .unwrap();

    let done = wait_for_terminal(&store, ok.id).await;
    assert_eq!(done.status, JobStatus::Succeeded);
    let failed = wait_for_terminal(&store, bad.id).await;
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("broken"));

    // Newest first through the service, same as over HTTP.
    let listed = service.list("owner").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, bad.id);
    assert_eq!(listed[1].id, ok.id);

    token.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn memory_queue_state_is_drained_by_the_in_process_worker() {
    // Same wiring the backend binary uses for QUEUE_KIND=memory: one state,
    // one queue instance, the worker loop running inside the process.
    let state = AppState::without_db(
        SecurityConfig::default(),
        Arc::new(MemoryJobStore::new()),
        Arc::new(MemoryQueue::new()),
    );
    let shutdown = CancellationToken::new();
    let handle = spawn_memory_worker(
        &state,
        WorkerSettings {
            stale_timeout: Duration::from_secs(600),
            concurrency: 1,
        },
        shutdown.clone(),
    );

    let service = JobsService::new(state.store.clone(), state.queue.clone());
    let job = service
        .submit("owner", json!({"task": "compact"}))
        .await
        .unwrap();

    // The submission must reach the loop this process spawned; there is no
    // other consumer for a memory queue.
    let mut done = None;
    for _ in 0..200 {
        let current = service.get("owner", job.id).await.unwrap();
        if current.status.is_terminal() {
            done = Some(current);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let done = done.expect("in-process worker should drain the submission");
    assert_eq!(done.status, JobStatus::Succeeded);

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn interrupted_job_is_failed_by_the_sweep_and_never_rerun() {
    let (store, queue, service, processor) = pipeline();

    let job = service.submit("owner", json!({"n": 1})).await.unwrap();

    // A worker claims the job and then dies without writing an outcome.
    let delivery = queue
        .dequeue(Duration::from_millis(50))
        .await
        .unwrap()
        .unwrap();
    store
        .update(
            job.id,
            JobUpdate::new()
                .with_status(JobStatus::Running)
                .expect_status(JobStatus::Pending),
        )
        .await
        .unwrap()
        .expect("claim should succeed");

    // The sweep gives up on it once it has sat in running for too long.
    let swept = processor.sweep_stale(Duration::ZERO).await.unwrap();
    assert_eq!(swept, 1);

    let failed = service.get("owner", job.id).await.unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("processing timed out"));

    // Redelivery of the stranded message finds a terminal job and acks it.
    processor.process(&delivery).await.unwrap();
    let after = service.get("owner", job.id).await.unwrap();
    assert_eq!(after.status, JobStatus::Failed);
    assert!(queue
        .dequeue(Duration::from_millis(10))
        .await
        .unwrap()
        .is_none());
}
