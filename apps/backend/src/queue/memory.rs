//! In-memory queue for tests and queue-less dev runs.
//!
//! Same contract as the Redis queue: FIFO delivery, messages stay in flight
//! until acked, `recover` requeues whatever a consumer left behind.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::warn;

use super::{Delivery, JobMessage, QueueClient, QueueError};

#[derive(Debug, Default)]
struct Inner {
    ready: VecDeque<String>,
    in_flight: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_pop(&self) -> Option<String> {
        let mut inner = self.inner.lock();
        let raw = inner.ready.pop_front()?;
        inner.in_flight.push(raw.clone());
        Some(raw)
    }

    fn release(&self, raw: &str) -> bool {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.in_flight.iter().position(|entry| entry == raw) {
            inner.in_flight.remove(pos);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn push_raw(&self, raw: &str) {
        self.inner.lock().ready.push_back(raw.to_string());
        self.notify.notify_one();
    }
}

#[async_trait]
impl QueueClient for MemoryQueue {
    async fn enqueue(&self, message: &JobMessage) -> Result<(), QueueError> {
        let encoded = serde_json::to_string(message)?;
        self.inner.lock().ready.push_back(encoded);
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<Delivery>, QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Register interest before checking so an enqueue racing the
            // check still wakes this waiter.
            let notified = self.notify.notified();

            if let Some(raw) = self.try_pop() {
                match serde_json::from_str::<JobMessage>(&raw) {
                    Ok(message) => return Ok(Some(Delivery { message, raw })),
                    Err(err) => {
                        warn!(error = %err, raw = %raw, "Discarding undecodable queue message");
                        self.release(&raw);
                        return Ok(None);
                    }
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        self.release(&delivery.raw);
        Ok(())
    }

    async fn nack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        if self.release(&delivery.raw) {
            self.inner.lock().ready.push_back(delivery.raw.clone());
            self.notify.notify_one();
        }
        Ok(())
    }

    async fn recover(&self) -> Result<u64, QueueError> {
        let mut inner = self.inner.lock();
        let drained: Vec<String> = inner.in_flight.drain(..).collect();
        let moved = drained.len() as u64;
        for raw in drained.into_iter().rev() {
            inner.ready.push_front(raw);
        }
        drop(inner);

        if moved > 0 {
            self.notify.notify_one();
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    const SHORT_WAIT: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn delivers_in_fifo_order() {
        let queue = MemoryQueue::new();
        let first = JobMessage::new(Uuid::new_v4());
        let second = JobMessage::new(Uuid::new_v4());

        queue.enqueue(&first).await.unwrap();
        queue.enqueue(&second).await.unwrap();

        let a = queue.dequeue(SHORT_WAIT).await.unwrap().unwrap();
        let b = queue.dequeue(SHORT_WAIT).await.unwrap().unwrap();
        assert_eq!(a.message, first);
        assert_eq!(b.message, second);
    }

    #[tokio::test]
    async fn dequeue_times_out_on_empty_queue() {
        let queue = MemoryQueue::new();
        assert!(queue.dequeue(SHORT_WAIT).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dequeue_wakes_on_enqueue() {
        let queue = std::sync::Arc::new(MemoryQueue::new());
        let producer = queue.clone();
        let message = JobMessage::new(Uuid::new_v4());
        let queued = message.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.enqueue(&queued).await.unwrap();
        });

        let delivery = queue
            .dequeue(Duration::from_secs(5))
            .await
            .unwrap()
            .expect("enqueue should wake the waiting consumer");
        assert_eq!(delivery.message, message);
    }

    #[tokio::test]
    async fn unacked_delivery_is_recovered() {
        let queue = MemoryQueue::new();
        let message = JobMessage::new(Uuid::new_v4());
        queue.enqueue(&message).await.unwrap();

        let delivery = queue.dequeue(SHORT_WAIT).await.unwrap().unwrap();
        // No ack: the consumer "crashed" holding the delivery.
        drop(delivery);

        assert_eq!(queue.recover().await.unwrap(), 1);
        let redelivered = queue.dequeue(SHORT_WAIT).await.unwrap().unwrap();
        assert_eq!(redelivered.message, message);
    }

    #[tokio::test]
    async fn acked_delivery_is_gone() {
        let queue = MemoryQueue::new();
        queue.enqueue(&JobMessage::new(Uuid::new_v4())).await.unwrap();

        let delivery = queue.dequeue(SHORT_WAIT).await.unwrap().unwrap();
        queue.ack(&delivery).await.unwrap();

        assert_eq!(queue.recover().await.unwrap(), 0);
        assert!(queue.dequeue(SHORT_WAIT).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn nack_redelivers_at_the_back() {
        let queue = MemoryQueue::new();
        let first = JobMessage::new(Uuid::new_v4());
        let second = JobMessage::new(Uuid::new_v4());
        queue.enqueue(&first).await.unwrap();
        queue.enqueue(&second).await.unwrap();

        let delivery = queue.dequeue(SHORT_WAIT).await.unwrap().unwrap();
        assert_eq!(delivery.message, first);
        queue.nack(&delivery).await.unwrap();

        let next = queue.dequeue(SHORT_WAIT).await.unwrap().unwrap();
        assert_eq!(next.message, second);
        let retried = queue.dequeue(SHORT_WAIT).await.unwrap().unwrap();
        assert_eq!(retried.message, first);
    }

    #[tokio::test]
    async fn undecodable_message_is_discarded() {
        let queue = MemoryQueue::new();
        queue.push_raw("not json");

        assert!(queue.dequeue(SHORT_WAIT).await.unwrap().is_none());
        // Discarded for good: neither recoverable nor redelivered.
        assert_eq!(queue.recover().await.unwrap(), 0);
        assert!(queue.dequeue(SHORT_WAIT).await.unwrap().is_none());
    }
}
