use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::db::DbProfile;
use crate::config::queue::{QueueKind, QueueSettings};
use crate::config::worker::WorkerSettings;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::queue::{MemoryQueue, QueueClient, RedisQueue};
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;
use crate::store::{MemoryJobStore, PgJobStore};
use crate::worker::{SimulatedExecutor, Worker};

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    security_config: SecurityConfig,
    db_profile: Option<DbProfile>,
    queue_settings: Option<QueueSettings>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            security_config: SecurityConfig::default(),
            db_profile: None,
            queue_settings: None,
        }
    }

    /// Persist jobs in Postgres under the given profile. Without this the
    /// state falls back to the in-memory store.
    pub fn with_db(mut self, profile: DbProfile) -> Self {
        self.db_profile = Some(profile);
        self
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = security_config;
        self
    }

    /// Select the queue backend. Without this the state uses the in-process
    /// queue, which offers no durability across restarts.
    pub fn with_queue(mut self, settings: QueueSettings) -> Self {
        self.queue_settings = Some(settings);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let queue = match &self.queue_settings {
            Some(settings) => build_queue(settings).await?,
            None => Arc::new(MemoryQueue::new()),
        };

        if let Some(profile) = self.db_profile {
            // single entrypoint: build + migrate
            let conn = bootstrap_db(profile).await?;
            let store = Arc::new(PgJobStore::new(conn.clone()));
            Ok(AppState::new(conn, self.security_config, store, queue))
        } else {
            Ok(AppState::without_db(
                self.security_config,
                Arc::new(MemoryJobStore::new()),
                queue,
            ))
        }
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

/// Connect the queue backend named by the settings.
///
/// Shared by the backend state builder and the worker binary so both ends of
/// the pipeline agree on the transport.
pub async fn build_queue(settings: &QueueSettings) -> Result<Arc<dyn QueueClient>, AppError> {
    match settings.kind {
        QueueKind::Redis => Ok(Arc::new(
            RedisQueue::connect(&settings.redis_url, &settings.queue_name).await?,
        )),
        QueueKind::Memory => Ok(Arc::new(MemoryQueue::new())),
    }
}

/// Run the worker loop inside this process, against the state's own store
/// and queue.
///
/// The memory queue exists only in the process that created it. When it is
/// selected, the backend must drain its own submissions; a separate worker
/// binary would connect its own empty queue and consume nothing.
pub fn spawn_memory_worker(
    state: &AppState,
    settings: WorkerSettings,
    shutdown: CancellationToken,
) -> JoinHandle<Result<(), AppError>> {
    let worker = Worker::new(
        state.store.clone(),
        state.queue.clone(),
        Arc::new(SimulatedExecutor),
        settings,
    );
    tokio::spawn(async move { worker.run(shutdown).await })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_without_db_uses_memory_backends() {
        let state = build_state().build().await.unwrap();
        assert!(state.db.is_none());
    }
}
