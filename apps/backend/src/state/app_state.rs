use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::security_config::SecurityConfig;
use crate::auth::verifier::TokenVerifier;
use crate::queue::QueueClient;
use crate::store::JobStore;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Database connection (optional; the memory store runs without one)
    pub db: Option<DatabaseConnection>,
    /// Job persistence
    pub store: Arc<dyn JobStore>,
    /// Queue used to hand jobs to the worker
    pub queue: Arc<dyn QueueClient>,
    /// Security configuration including JWT settings
    pub security: SecurityConfig,
    /// Token verifier built from the security configuration
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Create a new AppState with the given database connection and security config
    pub fn new(
        db: DatabaseConnection,
        security: SecurityConfig,
        store: Arc<dyn JobStore>,
        queue: Arc<dyn QueueClient>,
    ) -> Self {
        let verifier = Arc::new(TokenVerifier::new(security.clone()));
        Self {
            db: Some(db),
            store,
            queue,
            security,
            verifier,
        }
    }

    /// Create a new AppState without a database connection
    pub fn without_db(
        security: SecurityConfig,
        store: Arc<dyn JobStore>,
        queue: Arc<dyn QueueClient>,
    ) -> Self {
        let verifier = Arc::new(TokenVerifier::new(security.clone()));
        Self {
            db: None,
            store,
            queue,
            security,
            verifier,
        }
    }

    /// Create a test AppState backed by in-memory store and queue
    #[cfg(test)]
    pub fn for_tests() -> Self {
        use crate::queue::memory::MemoryQueue;
        use crate::store::memory::MemoryJobStore;

        Self::without_db(
            SecurityConfig::default(),
            Arc::new(MemoryJobStore::new()),
            Arc::new(MemoryQueue::new()),
        )
    }

    /// Create a test AppState with a specific security config
    #[cfg(test)]
    pub fn for_tests_with_security(security: SecurityConfig) -> Self {
        use crate::queue::memory::MemoryQueue;
        use crate::store::memory::MemoryJobStore;

        Self::without_db(
            security,
            Arc::new(MemoryJobStore::new()),
            Arc::new(MemoryQueue::new()),
        )
    }
}
