//! Single-delivery processing and the stale-job sweep.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::entities::jobs::JobStatus;
use crate::error::AppError;
use crate::queue::{Delivery, QueueClient};
use crate::store::{JobStore, JobUpdate};
use crate::worker::executor::JobExecutor;

/// Error text written by the stale sweep.
pub const STALE_JOB_ERROR: &str = "processing timed out";

pub struct Processor {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn QueueClient>,
    executor: Arc<dyn JobExecutor>,
}

impl Processor {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn QueueClient>,
        executor: Arc<dyn JobExecutor>,
    ) -> Self {
        Self {
            store,
            queue,
            executor,
        }
    }

    /// Drive one delivery through the job state machine.
    ///
    /// Delivery is at-least-once, so every step tolerates duplicates:
    /// a terminal job acks without re-executing, a running job acks and is
    /// left to its live owner or the stale sweep, and the pending -> running
    /// claim is guarded so exactly one consumer wins a race. The ack happens
    /// only after the terminal status is durably written; if that write
    /// fails the delivery is returned to the queue instead.
    pub async fn process(&self, delivery: &Delivery) -> Result<(), AppError> {
        let job_id = delivery.message.job_id;

        let job = match self.store.find_by_id(job_id).await {
            Ok(job) => job,
            Err(err) => {
                self.nack_quietly(delivery).await;
                return Err(err.into());
            }
        };

        let Some(job) = job else {
            // No row to update. Looping on this delivery would never help.
            warn!(job_id = %job_id, "Dropping delivery for unknown job");
            self.queue.ack(delivery).await?;
            return Ok(());
        };

        if job.status.is_terminal() {
            debug!(job_id = %job_id, status = ?job.status, "Job already terminal, dropping duplicate delivery");
            self.queue.ack(delivery).await?;
            return Ok(());
        }

        if job.status == JobStatus::Running {
            // Either a live consumer owns it or a crashed run left it
            // behind; the stale sweep covers the latter.
            debug!(job_id = %job_id, "Job already running, dropping delivery");
            self.queue.ack(delivery).await?;
            return Ok(());
        }

        let claim = JobUpdate::new()
            .with_status(JobStatus::Running)
            .expect_status(JobStatus::Pending);
        let claimed = match self.store.update(job_id, claim).await {
            Ok(claimed) => claimed,
            Err(err) => {
                self.nack_quietly(delivery).await;
                return Err(err.into());
            }
        };

        let Some(job) = claimed else {
            debug!(job_id = %job_id, "Claim missed, another consumer won the job");
            self.queue.ack(delivery).await?;
            return Ok(());
        };

        info!(job_id = %job_id, "Job started");

        let outcome = AssertUnwindSafe(self.executor.execute(&job))
            .catch_unwind()
            .await;

        let terminal = match outcome {
            Ok(Ok(result)) => JobUpdate::new()
                .with_status(JobStatus::Succeeded)
                .with_result(result),
            Ok(Err(err)) => {
                info!(job_id = %job_id, error = %err, "Job failed");
                JobUpdate::new()
                    .with_status(JobStatus::Failed)
                    .with_error(err.to_string())
            }
            Err(panic) => {
                let reason = panic_message(panic);
                warn!(job_id = %job_id, reason = %reason, "Job handler panicked");
                JobUpdate::new()
                    .with_status(JobStatus::Failed)
                    .with_error(format!("job handler panicked: {reason}"))
            }
        };

        let written = match self
            .store
            .update(job_id, terminal.expect_status(JobStatus::Running))
            .await
        {
            Ok(written) => written,
            Err(err) => {
                // The outcome is not durable yet. Redeliver rather than ack
                // so the job cannot silently stay running forever.
                self.nack_quietly(delivery).await;
                return Err(err.into());
            }
        };

        if written.is_none() {
            // The sweep or an operator moved the job while we ran it. The
            // recorded state wins over our outcome.
            warn!(job_id = %job_id, "Job left running state during execution, outcome discarded");
        } else {
            info!(job_id = %job_id, "Job finished");
        }

        self.queue.ack(delivery).await?;
        Ok(())
    }

    /// Fail every job that has sat in `running` longer than `older_than`.
    ///
    /// Covers consumers that died between claiming a job and writing its
    /// terminal status. The update is guarded on `running` so a job that
    /// finished between the list and the write is left alone.
    pub async fn sweep_stale(&self, older_than: Duration) -> Result<u64, AppError> {
        let cutoff = OffsetDateTime::now_utc() - older_than;
        let stuck = self.store.list_running_older_than(cutoff).await?;

        let mut swept = 0u64;
        for job in stuck {
            let update = JobUpdate::new()
                .with_status(JobStatus::Failed)
                .with_error(STALE_JOB_ERROR)
                .expect_status(JobStatus::Running);
            if self.store.update(job.id, update).await?.is_some() {
                warn!(job_id = %job.id, "Stale running job marked failed");
                swept += 1;
            }
        }
        Ok(swept)
    }

    async fn nack_quietly(&self, delivery: &Delivery) {
        if let Err(err) = self.queue.nack(delivery).await {
            warn!(
                job_id = %delivery.message.job_id,
                error = %err,
                "Failed to return delivery to the queue"
            );
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
