//! Queue backend selection and connection settings.

use std::env;

use crate::error::AppError;

/// Which queue implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    /// Redis-backed reliable queue. The default.
    Redis,
    /// In-process queue. Single-node dev and tests only; offers no
    /// durability across restarts.
    Memory,
}

#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub kind: QueueKind,
    pub redis_url: String,
    pub queue_name: String,
}

impl QueueSettings {
    /// Read queue settings from the environment.
    ///
    /// `QUEUE_KIND` selects the backend ("redis" or "memory"), `REDIS_URL`
    /// points at the broker, and `QUEUE_NAME` names the work list.
    pub fn from_env() -> Result<Self, AppError> {
        let kind = match env::var("QUEUE_KIND") {
            Ok(raw) => match raw.as_str() {
                "redis" => QueueKind::Redis,
                "memory" => QueueKind::Memory,
                other => {
                    return Err(AppError::config(format!(
                        "QUEUE_KIND must be 'redis' or 'memory', got '{other}'"
                    )))
                }
            },
            Err(_) => QueueKind::Redis,
        };

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let queue_name = env::var("QUEUE_NAME").unwrap_or_else(|_| "jobs".to_string());

        Ok(Self {
            kind,
            redis_url,
            queue_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::{QueueKind, QueueSettings};

    fn clear_env() {
        env::remove_var("QUEUE_KIND");
        env::remove_var("REDIS_URL");
        env::remove_var("QUEUE_NAME");
    }

    #[test]
    #[serial]
    fn defaults_to_redis() {
        clear_env();
        let settings = QueueSettings::from_env().unwrap();
        assert_eq!(settings.kind, QueueKind::Redis);
        assert_eq!(settings.redis_url, "redis://localhost:6379");
        assert_eq!(settings.queue_name, "jobs");
    }

    #[test]
    #[serial]
    fn reads_explicit_settings() {
        clear_env();
        env::set_var("QUEUE_KIND", "memory");
        env::set_var("REDIS_URL", "redis://queue.internal:6380");
        env::set_var("QUEUE_NAME", "jobs_test");

        let settings = QueueSettings::from_env().unwrap();
        assert_eq!(settings.kind, QueueKind::Memory);
        assert_eq!(settings.redis_url, "redis://queue.internal:6380");
        assert_eq!(settings.queue_name, "jobs_test");

        clear_env();
    }

    #[test]
    #[serial]
    fn rejects_unknown_kind() {
        clear_env();
        env::set_var("QUEUE_KIND", "kafka");

        let result = QueueSettings::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("QUEUE_KIND"));

        clear_env();
    }
}
