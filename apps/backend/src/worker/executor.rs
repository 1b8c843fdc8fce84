//! Job execution seam.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::store::Job;

/// Why a job's work did not complete.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExecutionError(String);

impl ExecutionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Performs the actual work for one claimed job.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Run the job to completion. `Ok` becomes the stored result document,
    /// `Err` becomes the stored error text.
    async fn execute(&self, job: &Job) -> Result<Value, ExecutionError>;
}

/// Executor that interprets the job payload as a script.
///
/// `{"sleep_ms": N}` stretches the run, `{"fail": "reason"}` forces a
/// failure. Anything else succeeds with a small result document.
pub struct SimulatedExecutor;

#[async_trait]
impl JobExecutor for SimulatedExecutor {
    async fn execute(&self, job: &Job) -> Result<Value, ExecutionError> {
        if let Some(ms) = job.payload.get("sleep_ms").and_then(Value::as_u64) {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }

        if let Some(reason) = job.payload.get("fail").and_then(Value::as_str) {
            return Err(ExecutionError::new(reason));
        }

        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());
        Ok(json!({
            "message": "Job completed successfully",
            "timestamp": timestamp,
        }))
    }
}
