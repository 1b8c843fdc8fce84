//! Postgres-backed `JobStore`.

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Job, JobStore};
use crate::adapters::jobs_sea::{self, dto::JobCreate, dto::JobUpdate};
use crate::errors::domain::DomainError;
use crate::infra::db_errors::map_db_err;

#[derive(Debug, Clone)]
pub struct PgJobStore {
    db: DatabaseConnection,
}

impl PgJobStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, new_job: JobCreate) -> Result<Job, DomainError> {
        jobs_sea::insert_job(&self.db, new_job)
            .await
            .map(Job::from)
            .map_err(map_db_err)
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<Job>, DomainError> {
        jobs_sea::find_by_id(&self.db, job_id)
            .await
            .map(|model| model.map(Job::from))
            .map_err(map_db_err)
    }

    async fn find_for_owner(
        &self,
        job_id: Uuid,
        owner_id: &str,
    ) -> Result<Option<Job>, DomainError> {
        jobs_sea::find_for_owner(&self.db, job_id, owner_id)
            .await
            .map(|model| model.map(Job::from))
            .map_err(map_db_err)
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Job>, DomainError> {
        jobs_sea::list_for_owner(&self.db, owner_id)
            .await
            .map(|models| models.into_iter().map(Job::from).collect())
            .map_err(map_db_err)
    }

    async fn list_running_older_than(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<Vec<Job>, DomainError> {
        jobs_sea::list_running_older_than(&self.db, cutoff)
            .await
            .map(|models| models.into_iter().map(Job::from).collect())
            .map_err(map_db_err)
    }

    async fn update(&self, job_id: Uuid, update: JobUpdate) -> Result<Option<Job>, DomainError> {
        jobs_sea::update_job(&self.db, job_id, update)
            .await
            .map(|model| model.map(Job::from))
            .map_err(map_db_err)
    }
}
