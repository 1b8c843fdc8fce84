//! DTOs for the jobs_sea adapter.

use serde_json::Value;
use uuid::Uuid;

use crate::entities::jobs::JobStatus;

/// DTO for inserting a new job. The id is generated up front so callers can
/// hand it to the queue without re-reading the row.
#[derive(Debug, Clone)]
pub struct JobCreate {
    pub id: Uuid,
    pub owner_id: String,
    pub payload: Value,
}

impl JobCreate {
    pub fn new(owner_id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            payload,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}

/// Unified DTO for updating job fields.
///
/// `expect_status` guards the update: when set, the row is only written while
/// it still holds that status, and a guard miss comes back as a no-op.
/// `updated_at` is refreshed on every update regardless of which fields
/// change.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub expect_status: Option<JobStatus>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn expect_status(mut self, status: JobStatus) -> Self {
        self.expect_status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn job_create_generates_distinct_ids() {
        let a = JobCreate::new("owner-1", json!({}));
        let b = JobCreate::new("owner-1", json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn job_update_builder_chains() {
        let update = JobUpdate::new()
            .with_status(JobStatus::Failed)
            .with_error("boom")
            .expect_status(JobStatus::Running);

        assert_eq!(update.status, Some(JobStatus::Failed));
        assert_eq!(update.error.as_deref(), Some("boom"));
        assert_eq!(update.expect_status, Some(JobStatus::Running));
        assert_eq!(update.result, None);
    }
}
