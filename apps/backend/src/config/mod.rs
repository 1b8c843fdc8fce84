//! Environment-driven configuration.

pub mod db;
pub mod queue;
pub mod worker;
