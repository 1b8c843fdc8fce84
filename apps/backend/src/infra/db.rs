use std::future::Future;
use std::time::Duration;

use migration::MigrationCommand;
use sea_orm::{Database, DatabaseConnection};
use tracing::{info, warn};

use crate::config::db::{db_url, DbOwner, DbProfile};
use crate::error::AppError;

/// Connection attempts before giving up on a cold database.
const CONNECT_MAX_ATTEMPTS: u32 = 5;

/// Pause between connection attempts.
const CONNECT_RETRY_INTERVAL_MS: u64 = 500;

/// Connect to the jobs database for the given profile and owner.
///
/// Retries briefly so a backend starting alongside its database does not lose
/// the race. This function does NOT run any migrations.
pub async fn connect_db(
    profile: DbProfile,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let database_url = db_url(profile, owner)?;

    retry_connection(
        || {
            let url = database_url.clone();
            async move { Database::connect(&url).await.map_err(AppError::from) }
        },
        CONNECT_MAX_ATTEMPTS,
        CONNECT_RETRY_INTERVAL_MS,
    )
    .await
}

/// Build the app DB *and* guarantee the schema is current.
///
/// Migrations run on a short-lived owner-credential connection; the returned
/// connection uses app credentials only.
pub async fn bootstrap_db(profile: DbProfile) -> Result<DatabaseConnection, AppError> {
    let owner_conn = connect_db(profile.clone(), DbOwner::Owner).await?;
    migration::migrate(&owner_conn, MigrationCommand::Up).await?;
    owner_conn.close().await?;
    info!("bootstrap=ready profile={:?}", profile);

    connect_db(profile, DbOwner::App).await
}

/// Retry a connection attempt with fixed interval delays.
/// Returns the result of the last attempt after all retries are exhausted.
async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match connect_fn().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        "connection_retry=success attempts={} interval_ms={}",
                        attempt, interval_ms
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < max_attempts {
                    warn!(
                        "connection_retry=failed attempt={} max_attempts={} interval_ms={}",
                        attempt, max_attempts, interval_ms
                    );
                    tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        AppError::db_unavailable("connection retry exhausted with no recorded error")
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::retry_connection;
    use crate::error::AppError;

    #[tokio::test]
    async fn retry_returns_first_success() {
        let calls = AtomicU32::new(0);

        let result = retry_connection(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(AppError::db_unavailable("not yet"))
                    } else {
                        Ok(42u32)
                    }
                }
            },
            5,
            1,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<u32, _> = retry_connection(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::db_unavailable("still down")) }
            },
            3,
            1,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
