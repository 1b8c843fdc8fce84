//! Job persistence.
//!
//! The `JobStore` trait is the seam between job semantics and storage. The
//! Postgres implementation goes through the jobs_sea adapter; the in-memory
//! one backs tests and single-node dev runs.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::jobs::{self, JobStatus};
use crate::errors::domain::DomainError;

pub use crate::adapters::jobs_sea::dto::{JobCreate, JobUpdate};
pub use memory::MemoryJobStore;
pub use pg::PgJobStore;

/// A job as the rest of the application sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub owner_id: String,
    pub status: JobStatus,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<jobs::Model> for Job {
    fn from(model: jobs::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            status: model.status,
            payload: model.payload,
            result: model.result,
            error: model.error,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new pending job.
    async fn create(&self, new_job: JobCreate) -> Result<Job, DomainError>;

    /// Fetch a job regardless of owner. Worker-side use.
    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<Job>, DomainError>;

    /// Fetch a job as one owner sees it; a job owned by someone else reads
    /// as absent.
    async fn find_for_owner(
        &self,
        job_id: Uuid,
        owner_id: &str,
    ) -> Result<Option<Job>, DomainError>;

    /// All of an owner's jobs, newest first.
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Job>, DomainError>;

    /// Jobs stuck in `running` whose last update predates the cutoff.
    async fn list_running_older_than(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<Vec<Job>, DomainError>;

    /// Apply a guarded update and return the refreshed job. `None` means the
    /// job does not exist or the `expect_status` guard missed; the caller
    /// decides which of those it cares about.
    async fn update(&self, job_id: Uuid, update: JobUpdate) -> Result<Option<Job>, DomainError>;
}
