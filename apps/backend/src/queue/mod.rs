//! Job queue transport.
//!
//! The queue carries only job ids; payloads live on the job row. Deliveries
//! are at-least-once: a message stays owned by the queue until `ack`, so a
//! consumer crash leads to redelivery, not loss.

pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryQueue;
pub use redis::RedisQueue;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("invalid queue configuration: {0}")]
    Config(String),
    #[error("queue unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode queue message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Wire format of a queued message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    pub job_id: Uuid,
}

impl JobMessage {
    pub fn new(job_id: Uuid) -> Self {
        Self { job_id }
    }
}

/// An in-flight message. `raw` is the exact payload the broker holds and is
/// what `ack` uses to release it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: JobMessage,
    pub raw: String,
}

#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Append a message for later delivery.
    async fn enqueue(&self, message: &JobMessage) -> Result<(), QueueError>;

    /// Wait up to `timeout` for the next message. `None` on timeout.
    async fn dequeue(&self, timeout: Duration) -> Result<Option<Delivery>, QueueError>;

    /// Release a delivery after the consumer has durably recorded its outcome.
    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Return a delivery to the queue for a later retry.
    async fn nack(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Requeue messages left in flight by a previous run. Call before any
    /// consumer starts; returns how many messages were moved.
    async fn recover(&self) -> Result<u64, QueueError>;
}
