use std::sync::Arc;

use backend::config::db::{DbOwner, DbProfile};
use backend::config::queue::{QueueKind, QueueSettings};
use backend::config::worker::WorkerSettings;
use backend::infra::db::connect_db;
use backend::infra::state::build_queue;
use backend::store::PgJobStore;
use backend::telemetry;
use backend::worker::{SimulatedExecutor, Worker};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment,
    // same contract as the backend binary.
    let queue_settings = match QueueSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    // The memory queue lives inside the backend process, which drains it
    // itself; a queue built here would never see those submissions.
    if queue_settings.kind == QueueKind::Memory {
        eprintln!(
            "❌ QUEUE_KIND=memory is process-local and cannot feed a separate worker; \
             use QUEUE_KIND=redis"
        );
        std::process::exit(1);
    }

    let worker_settings = match WorkerSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    println!(
        "🚀 Starting Jobwell Worker (concurrency: {})",
        worker_settings.concurrency
    );

    let conn = match connect_db(DbProfile::Prod, DbOwner::App).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("❌ Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };
    println!("✅ Database connected");

    let queue = match build_queue(&queue_settings).await {
        Ok(queue) => queue,
        Err(e) => {
            eprintln!("❌ Failed to connect to queue: {e}");
            std::process::exit(1);
        }
    };

    let worker = Worker::new(
        Arc::new(PgJobStore::new(conn)),
        queue,
        Arc::new(SimulatedExecutor),
        worker_settings,
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    if let Err(e) = worker.run(shutdown).await {
        eprintln!("❌ Worker exited with error: {e}");
        std::process::exit(1);
    }
}
