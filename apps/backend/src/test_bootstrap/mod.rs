//! Shared wiring for unit tests.

pub mod logging;
