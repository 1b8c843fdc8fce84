use actix_web::{web, App, HttpServer};
use backend::config::db::DbProfile;
use backend::config::queue::{QueueKind, QueueSettings};
use backend::config::worker::WorkerSettings;
use backend::infra::state::{build_state, spawn_memory_worker};
use backend::middleware::cors::cors_middleware;
use backend::middleware::request_trace::RequestTrace;
use backend::middleware::structured_logger::StructuredLogger;
use backend::middleware::trace_span::TraceSpan;
use backend::routes;
use backend::state::security_config::SecurityConfig;
use backend::telemetry;
use tokio_util::sync::CancellationToken;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: Set via docker-compose env_file or docker run --env-file
    // - Local dev: Source env files manually (e.g., set -a; . ./.env; set +a)
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            eprintln!("❌ BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        });

    println!("🚀 Starting Jobwell Backend on http://{}:{}", host, port);

    let security_config = match SecurityConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    let queue_settings = match QueueSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    let queue_kind = queue_settings.kind;

    // Create application state using unified builder
    let app_state = match build_state()
        .with_db(DbProfile::Prod)
        .with_security(security_config)
        .with_queue(queue_settings)
        .build()
        .await
    {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    println!("✅ Database connected");

    // The memory queue never leaves this process, so submissions are drained
    // here instead of by the worker binary.
    let shutdown = CancellationToken::new();
    let worker_handle = if queue_kind == QueueKind::Memory {
        let worker_settings = match WorkerSettings::from_env() {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
        };
        println!(
            "📦 Memory queue selected; processing jobs in-process (concurrency: {})",
            worker_settings.concurrency
        );
        Some(spawn_memory_worker(
            &app_state,
            worker_settings,
            shutdown.clone(),
        ))
    } else {
        None
    };

    // Wrap AppState with web::Data before passing to HttpServer
    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    shutdown.cancel();
    if let Some(handle) = worker_handle {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => eprintln!("❌ Worker exited with error: {e}"),
            Err(e) => eprintln!("❌ Worker task aborted: {e}"),
        }
    }
    Ok(())
}
