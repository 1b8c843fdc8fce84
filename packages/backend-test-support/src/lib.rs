//! Backend test support utilities
//!
//! Shared helpers for backend unit and integration tests: unified logging
//! initialization and problem-details response assertions. Deliberately
//! does not depend on the backend crate itself.

pub mod logging;
pub mod problem_details;
