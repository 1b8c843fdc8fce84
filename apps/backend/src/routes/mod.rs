use actix_web::web;

pub mod health;
pub mod jobs;

/// Configure application routes for tests and non-HttpServer contexts.
///
/// `main.rs` wires the same paths inside the full middleware stack; tests
/// register them through here so endpoint behavior can be exercised with
/// whatever wrapping the test needs.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Health check routes: / and /health
    health::configure_routes(cfg);

    // Job routes: /jobs/**
    cfg.service(web::scope("/jobs").configure(jobs::configure_routes));
}
