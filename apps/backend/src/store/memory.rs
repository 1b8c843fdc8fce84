//! In-memory `JobStore` used by tests and queue-less dev runs.
//!
//! Mirrors the Postgres semantics: guarded updates miss as `None`, every
//! successful update refreshes `updated_at`, listings come back newest first.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Job, JobCreate, JobStore, JobUpdate};
use crate::entities::jobs::JobStatus;
use crate::errors::domain::DomainError;

#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryJobStore {
    /// Rewrite `updated_at` in place, bypassing the refresh `update` always
    /// performs. Lets unit tests stage rows that aged before the process
    /// under test started.
    pub(crate) fn backdate_updated_at(&self, job_id: Uuid, updated_at: OffsetDateTime) {
        if let Some(job) = self.jobs.write().get_mut(&job_id) {
            job.updated_at = updated_at;
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, new_job: JobCreate) -> Result<Job, DomainError> {
        let now = OffsetDateTime::now_utc();
        let job = Job {
            id: new_job.id,
            owner_id: new_job.owner_id,
            status: JobStatus::Pending,
            payload: new_job.payload,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().insert(job.id, job.clone());
        Ok(job)
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<Job>, DomainError> {
        Ok(self.jobs.read().get(&job_id).cloned())
    }

    async fn find_for_owner(
        &self,
        job_id: Uuid,
        owner_id: &str,
    ) -> Result<Option<Job>, DomainError> {
        Ok(self
            .jobs
            .read()
            .get(&job_id)
            .filter(|job| job.owner_id == owner_id)
            .cloned())
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Job>, DomainError> {
        let mut jobs: Vec<Job> = self
            .jobs
            .read()
            .values()
            .filter(|job| job.owner_id == owner_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn list_running_older_than(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<Vec<Job>, DomainError> {
        Ok(self
            .jobs
            .read()
            .values()
            .filter(|job| job.status == JobStatus::Running && job.updated_at < cutoff)
            .cloned()
            .collect())
    }

    async fn update(&self, job_id: Uuid, update: JobUpdate) -> Result<Option<Job>, DomainError> {
        let mut jobs = self.jobs.write();
        let Some(job) = jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        if let Some(expected) = update.expect_status {
            if job.status != expected {
                return Ok(None);
            }
        }
        if let Some(status) = update.status {
            job.status = status;
        }
        if let Some(result) = update.result {
            job.result = Some(result);
        }
        if let Some(error) = update.error {
            job.error = Some(error);
        }
        job.updated_at = OffsetDateTime::now_utc();
        Ok(Some(job.clone()))
    }
}
