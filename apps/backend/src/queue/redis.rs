//! Redis-backed queue built on LPUSH / BRPOPLPUSH / LREM.
//!
//! Messages wait on the main list and sit on a `:processing` list while in
//! flight. `ack` removes the processing entry; anything still there at
//! startup is moved back by `recover`.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{Delivery, JobMessage, QueueClient, QueueError};

// Enqueue retry configuration (HTTP request path)
const ENQUEUE_MAX_ATTEMPTS: u32 = 3;
const ENQUEUE_INITIAL_RETRY_DELAY_MS: u64 = 50;
const ENQUEUE_MAX_RETRY_DELAY_MS: u64 = 200;

pub struct RedisQueue {
    client: Client,
    commands: Mutex<ConnectionManager>,
    // Idle connections for blocking pops. BRPOPLPUSH holds its connection
    // for the whole wait, so every concurrent consumer takes its own; the
    // pool grows to the number of consumers and never stalls enqueue or ack
    // traffic.
    blocking: Mutex<Vec<ConnectionManager>>,
    queue: String,
    processing: String,
}

impl RedisQueue {
    pub async fn connect(redis_url: &str, queue_name: &str) -> Result<Self, QueueError> {
        let client = Client::open(redis_url)
            .map_err(|err| QueueError::Config(format!("Invalid REDIS_URL: {err}")))?;

        let commands = ConnectionManager::new(client.clone())
            .await
            .map_err(|err| QueueError::Unavailable(err.to_string()))?;
        let blocking = ConnectionManager::new(client.clone())
            .await
            .map_err(|err| QueueError::Unavailable(err.to_string()))?;

        Ok(Self {
            client,
            commands: Mutex::new(commands),
            blocking: Mutex::new(vec![blocking]),
            queue: queue_name.to_string(),
            processing: format!("{queue_name}:processing"),
        })
    }
}

#[async_trait]
impl QueueClient for RedisQueue {
    async fn enqueue(&self, message: &JobMessage) -> Result<(), QueueError> {
        let encoded = serde_json::to_string(message)?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let push_res = {
                let mut commands = self.commands.lock().await;
                commands.lpush::<_, _, ()>(&self.queue, &encoded).await
            };

            match push_res {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if attempt >= ENQUEUE_MAX_ATTEMPTS {
                        return Err(QueueError::Unavailable(err.to_string()));
                    }

                    let delay_ms = ENQUEUE_INITIAL_RETRY_DELAY_MS
                        .saturating_mul(2_u64.pow(attempt - 1))
                        .min(ENQUEUE_MAX_RETRY_DELAY_MS);
                    warn!(
                        error = %err,
                        attempt,
                        retry_delay_ms = delay_ms,
                        "Redis enqueue failed, retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<Delivery>, QueueError> {
        let pooled = self.blocking.lock().await.pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => ConnectionManager::new(self.client.clone())
                .await
                .map_err(|err| QueueError::Unavailable(err.to_string()))?,
        };

        // A failed pop drops the connection instead of returning it; the next
        // consumer dials a fresh one.
        let raw: Option<String> = conn
            .brpoplpush(&self.queue, &self.processing, timeout.as_secs_f64())
            .await
            .map_err(|err| QueueError::Unavailable(err.to_string()))?;
        self.blocking.lock().await.push(conn);

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str::<JobMessage>(&raw) {
            Ok(message) => Ok(Some(Delivery { message, raw })),
            Err(err) => {
                // Dropping the entry keeps a poison message from being
                // redelivered forever.
                warn!(error = %err, raw = %raw, "Discarding undecodable queue message");
                let mut commands = self.commands.lock().await;
                let _: u64 = commands
                    .lrem(&self.processing, 1, &raw)
                    .await
                    .map_err(|err| QueueError::Unavailable(err.to_string()))?;
                Ok(None)
            }
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut commands = self.commands.lock().await;
        let removed: u64 = commands
            .lrem(&self.processing, 1, &delivery.raw)
            .await
            .map_err(|err| QueueError::Unavailable(err.to_string()))?;

        if removed == 0 {
            debug!(
                job_id = %delivery.message.job_id,
                "Ack found no in-flight entry"
            );
        }
        Ok(())
    }

    async fn nack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        // Requeue before releasing the in-flight entry; a crash in between
        // duplicates the message instead of losing it.
        let mut commands = self.commands.lock().await;
        commands
            .lpush::<_, _, ()>(&self.queue, &delivery.raw)
            .await
            .map_err(|err| QueueError::Unavailable(err.to_string()))?;
        let _: u64 = commands
            .lrem(&self.processing, 1, &delivery.raw)
            .await
            .map_err(|err| QueueError::Unavailable(err.to_string()))?;
        Ok(())
    }

    async fn recover(&self) -> Result<u64, QueueError> {
        let mut commands = self.commands.lock().await;
        let mut moved = 0u64;
        loop {
            let raw: Option<String> = commands
                .rpoplpush(&self.processing, &self.queue)
                .await
                .map_err(|err| QueueError::Unavailable(err.to_string()))?;
            if raw.is_none() {
                break;
            }
            moved += 1;
        }

        if moved > 0 {
            warn!(moved, "Requeued in-flight messages from a previous run");
        }
        Ok(moved)
    }
}
