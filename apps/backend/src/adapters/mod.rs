//! Adapters for external dependencies.

pub mod jobs_sea;
