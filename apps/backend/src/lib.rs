#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod adapters;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod infra;
pub mod middleware;
pub mod queue;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod trace_ctx;
pub mod worker;

#[cfg(test)]
pub mod test_bootstrap;

// Re-exports for public API
pub use auth::claims::Claims;
pub use auth::verifier::TokenVerifier;
pub use config::db::{db_url, DbOwner, DbProfile};
pub use error::AppError;
pub use errors::ErrorCode;
pub use extractors::auth_token::AuthToken;
pub use extractors::current_user::CurrentUser;
pub use extractors::validated_json::ValidatedJson;
pub use infra::db::connect_db;
pub use middleware::cors::cors_middleware;
pub use middleware::request_trace::RequestTrace;
pub use middleware::structured_logger::StructuredLogger;
pub use middleware::trace_span::TraceSpan;
pub use queue::{JobMessage, QueueClient};
pub use state::app_state::AppState;
pub use state::security_config::SecurityConfig;
pub use store::{Job, JobStore};
pub use worker::{Processor, Worker};

// Prelude for test convenience
pub mod prelude {
    pub use super::auth::*;
    pub use super::config::db::*;
    pub use super::error::*;
    pub use super::extractors::*;
    pub use super::infra::*;
    pub use super::middleware::*;
    pub use super::state::*;
}

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
