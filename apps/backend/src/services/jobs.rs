//! Job submission and retrieval services.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::queue::{JobMessage, QueueClient};
use crate::store::{Job, JobCreate, JobStore};

/// Job domain service.
pub struct JobsService {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn QueueClient>,
}

impl JobsService {
    pub fn new(store: Arc<dyn JobStore>, queue: Arc<dyn QueueClient>) -> Self {
        Self { store, queue }
    }

    /// Record a new job, then hand its id to the queue.
    ///
    /// The row is written first. A job that exists but was never enqueued is
    /// still discoverable as pending; an enqueued id without a row would be
    /// meaningless to the worker. On enqueue failure the pending row stays
    /// in place and the submission reports the failure.
    pub async fn submit(&self, owner_id: &str, payload: Value) -> Result<Job, AppError> {
        let job = self
            .store
            .create(JobCreate::new(owner_id, payload))
            .await
            .map_err(AppError::from)?;

        if let Err(err) = self.queue.enqueue(&JobMessage::new(job.id)).await {
            warn!(
                job_id = %job.id,
                error = %err,
                "Job recorded but enqueue failed, row stays pending"
            );
            return Err(AppError::queue(
                "Job was recorded but could not be queued for processing",
            ));
        }

        info!(job_id = %job.id, "Job submitted");
        Ok(job)
    }

    /// Fetch one of the owner's jobs. A job that does not exist and a job
    /// owned by someone else produce the same not-found error.
    pub async fn get(&self, owner_id: &str, job_id: Uuid) -> Result<Job, AppError> {
        self.store
            .find_for_owner(job_id, owner_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(AppError::job_not_found)
    }

    /// List the owner's jobs, newest first.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Job>, AppError> {
        self.store
            .list_for_owner(owner_id)
            .await
            .map_err(AppError::from)
    }
}
