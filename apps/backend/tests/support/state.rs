//! AppState builders for tests.
//!
//! Integration tests run against in-memory store and queue backends so no
//! external services are needed.

use std::sync::Arc;

use backend::queue::{MemoryQueue, QueueClient};
use backend::state::app_state::AppState;
use backend::state::security_config::SecurityConfig;
use backend::store::{JobStore, MemoryJobStore};

/// In-memory AppState with the default test security config.
pub fn build_test_state() -> AppState {
    build_test_state_with_security(SecurityConfig::default())
}

/// In-memory AppState with an explicit security config.
pub fn build_test_state_with_security(security: SecurityConfig) -> AppState {
    AppState::without_db(
        security,
        Arc::new(MemoryJobStore::new()),
        Arc::new(MemoryQueue::new()),
    )
}

/// AppState over caller-supplied backends, for tests that need to observe
/// or break one side of the pipeline.
pub fn build_test_state_with(store: Arc<dyn JobStore>, queue: Arc<dyn QueueClient>) -> AppState {
    AppState::without_db(SecurityConfig::default(), store, queue)
}
