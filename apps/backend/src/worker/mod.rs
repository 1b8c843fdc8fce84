//! Queue consumer that drives jobs through their lifecycle.

pub mod executor;
pub mod processor;
pub mod runner;

pub use executor::{ExecutionError, JobExecutor, SimulatedExecutor};
pub use processor::Processor;
pub use runner::Worker;
