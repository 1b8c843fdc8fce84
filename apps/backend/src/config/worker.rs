//! Worker tuning knobs.

use std::env;
use std::time::Duration;

use crate::error::AppError;

/// Default time a job may sit in `running` before it is presumed lost.
const DEFAULT_STALE_TIMEOUT_SECS: u64 = 600;

/// Default number of concurrent job executions per worker process.
const DEFAULT_CONCURRENCY: usize = 1;

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub stale_timeout: Duration,
    pub concurrency: usize,
}

impl WorkerSettings {
    /// Read worker settings from the environment.
    ///
    /// `WORKER_STALE_TIMEOUT_SECS` bounds how long a `running` job is trusted
    /// before redelivery may reclaim it; `WORKER_CONCURRENCY` caps in-flight
    /// executions.
    pub fn from_env() -> Result<Self, AppError> {
        let stale_timeout_secs = parse_var("WORKER_STALE_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_STALE_TIMEOUT_SECS);
        let concurrency = parse_var("WORKER_CONCURRENCY")?.unwrap_or(DEFAULT_CONCURRENCY);

        if concurrency == 0 {
            return Err(AppError::config("WORKER_CONCURRENCY must be at least 1"));
        }

        Ok(Self {
            stale_timeout: Duration::from_secs(stale_timeout_secs),
            concurrency,
        })
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            stale_timeout: Duration::from_secs(DEFAULT_STALE_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::config(format!("{name} must be a positive integer, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::time::Duration;

    use serial_test::serial;

    use super::WorkerSettings;

    fn clear_env() {
        env::remove_var("WORKER_STALE_TIMEOUT_SECS");
        env::remove_var("WORKER_CONCURRENCY");
    }

    #[test]
    #[serial]
    fn defaults_apply() {
        clear_env();
        let settings = WorkerSettings::from_env().unwrap();
        assert_eq!(settings.stale_timeout, Duration::from_secs(600));
        assert_eq!(settings.concurrency, 1);
    }

    #[test]
    #[serial]
    fn reads_explicit_settings() {
        clear_env();
        env::set_var("WORKER_STALE_TIMEOUT_SECS", "30");
        env::set_var("WORKER_CONCURRENCY", "4");

        let settings = WorkerSettings::from_env().unwrap();
        assert_eq!(settings.stale_timeout, Duration::from_secs(30));
        assert_eq!(settings.concurrency, 4);

        clear_env();
    }

    #[test]
    #[serial]
    fn rejects_zero_concurrency() {
        clear_env();
        env::set_var("WORKER_CONCURRENCY", "0");

        let result = WorkerSettings::from_env();
        assert!(result.is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn rejects_garbage_numbers() {
        clear_env();
        env::set_var("WORKER_STALE_TIMEOUT_SECS", "soon");

        let result = WorkerSettings::from_env();
        assert!(result.is_err());

        clear_env();
    }
}
