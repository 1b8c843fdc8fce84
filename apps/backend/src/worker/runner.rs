//! Worker run loop: queue recovery, consumers, stale sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::worker::WorkerSettings;
use crate::error::AppError;
use crate::queue::QueueClient;
use crate::store::JobStore;
use crate::worker::executor::JobExecutor;
use crate::worker::processor::Processor;

const DEQUEUE_WAIT: Duration = Duration::from_secs(5);
const ERROR_BACKOFF: Duration = Duration::from_secs(1);
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

pub struct Worker {
    processor: Arc<Processor>,
    queue: Arc<dyn QueueClient>,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn QueueClient>,
        executor: Arc<dyn JobExecutor>,
        settings: WorkerSettings,
    ) -> Self {
        let processor = Arc::new(Processor::new(store, queue.clone(), executor));
        Self {
            processor,
            queue,
            settings,
        }
    }

    /// Run consumers and the stale sweep until the token is cancelled.
    ///
    /// Messages left in flight by a previous run are requeued before the
    /// first consumer starts, so nothing is consumed twice concurrently.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), AppError> {
        let recovered = self.queue.recover().await?;
        if recovered > 0 {
            info!(recovered, "Recovered in-flight messages from previous run");
        }

        let mut handles = Vec::with_capacity(self.settings.concurrency + 1);
        for consumer_id in 0..self.settings.concurrency {
            let processor = self.processor.clone();
            let queue = self.queue.clone();
            let token = shutdown.clone();
            handles.push(tokio::spawn(async move {
                consume_loop(consumer_id, processor, queue, token).await;
            }));
        }

        let sweeper = self.processor.clone();
        let stale_timeout = self.settings.stale_timeout;
        let sweep_token = shutdown.clone();
        handles.push(tokio::spawn(async move {
            sweep_loop(sweeper, stale_timeout, sweep_token).await;
        }));

        for handle in handles {
            if let Err(err) = handle.await {
                error!(error = %err, "Worker task aborted");
            }
        }
        info!("Worker stopped");
        Ok(())
    }
}

async fn consume_loop(
    consumer_id: usize,
    processor: Arc<Processor>,
    queue: Arc<dyn QueueClient>,
    shutdown: CancellationToken,
) {
    info!(consumer_id, "Consumer started");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            polled = queue.dequeue(DEQUEUE_WAIT) => match polled {
                Ok(Some(delivery)) => {
                    if let Err(err) = processor.process(&delivery).await {
                        error!(
                            consumer_id,
                            job_id = %delivery.message.job_id,
                            error = %err,
                            "Processing failed, delivery returned to queue"
                        );
                        sleep(ERROR_BACKOFF).await;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    error!(consumer_id, error = %err, "Dequeue failed");
                    sleep(ERROR_BACKOFF).await;
                }
            },
        }
    }
    info!(consumer_id, "Consumer stopped");
}

async fn sweep_loop(
    processor: Arc<Processor>,
    stale_timeout: Duration,
    shutdown: CancellationToken,
) {
    // Sweep at least once per timeout window. The first pass runs before any
    // sleep so jobs stranded across a restart are failed right away instead
    // of waiting out an extra period.
    let period = stale_timeout.min(MAX_SWEEP_PERIOD);
    loop {
        match processor.sweep_stale(stale_timeout).await {
            Ok(0) => {}
            Ok(swept) => warn!(swept, "Stale running jobs marked failed"),
            Err(err) => error!(error = %err, "Stale job sweep failed"),
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = sleep(period) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::OffsetDateTime;

    use super::*;
    use crate::entities::jobs::JobStatus;
    use crate::queue::{JobMessage, MemoryQueue};
    use crate::store::{Job, JobCreate, JobUpdate, MemoryJobStore};
    use crate::worker::executor::SimulatedExecutor;

    async fn wait_for_terminal(store: &MemoryJobStore, job_id: uuid::Uuid) -> Job {
        for _ in 0..200 {
            if let Some(job) = store.find_by_id(job_id).await.unwrap() {
                if job.status.is_terminal() {
                    return job;
                }
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("job did not reach a terminal status in time");
    }

    #[tokio::test]
    async fn run_consumes_jobs_until_cancelled() {
        let store = Arc::new(MemoryJobStore::new());
        let queue = Arc::new(MemoryQueue::new());
        let settings = WorkerSettings {
            stale_timeout: Duration::from_secs(600),
            concurrency: 2,
        };
        let worker = Arc::new(Worker::new(
            store.clone(),
            queue.clone(),
            Arc::new(SimulatedExecutor),
            settings,
        ));

        let token = CancellationToken::new();
        let run_token = token.clone();
        let run_worker = worker.clone();
        let run = tokio::spawn(async move { run_worker.run(run_token).await });

        let ok_job = store
            .create(JobCreate::new("owner", json!({})))
            .await
            .unwrap();
        queue.enqueue(&JobMessage::new(ok_job.id)).await.unwrap();
        let bad_job = store
            .create(JobCreate::new("owner", json!({"fail": "nope"})))
            .await
            .unwrap();
        queue.enqueue(&JobMessage::new(bad_job.id)).await.unwrap();

        let done = wait_for_terminal(&store, ok_job.id).await;
        assert_eq!(done.status, JobStatus::Succeeded);
        let failed = wait_for_terminal(&store, bad_job.id).await;
        assert_eq!(failed.status, JobStatus::Failed);

        token.cancel();
        run.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn jobs_already_stale_are_swept_at_startup() {
        let store = Arc::new(MemoryJobStore::new());
        let queue = Arc::new(MemoryQueue::new());

        // A run from a previous process claimed the job and died; its row has
        // been sitting in running for two hours.
        let job = store
            .create(JobCreate::new("owner", json!({})))
            .await
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
            .unwrap();
        store.backdate_updated_at(job.id, OffsetDateTime::now_utc() - time::Duration::hours(2));

        let settings = WorkerSettings {
            stale_timeout: Duration::from_secs(3600),
            concurrency: 1,
        };
        let worker = Arc::new(Worker::new(
            store.clone(),
            queue.clone(),
            Arc::new(SimulatedExecutor),
            settings,
        ));

        let token = CancellationToken::new();
        let run_token = token.clone();
        let run_worker = worker.clone();
        let run = tokio::spawn(async move { run_worker.run(run_token).await });

        // The sweep period here is a full minute; only a first pass that runs
        // before the sleep can fail the job within this window.
        let failed = wait_for_terminal(&store, job.id).await;
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("processing timed out"));

        token.cancel();
        run.await.unwrap().unwrap();
    }
}
