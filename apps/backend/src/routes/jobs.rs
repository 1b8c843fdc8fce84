//! Job submission and retrieval routes.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::current_user::CurrentUser;
use crate::extractors::validated_json::ValidatedJson;
use crate::services::jobs::JobsService;
use crate::state::app_state::AppState;
use crate::store::Job;

#[derive(Debug, Deserialize)]
struct SubmitJobRequest {
    #[serde(default)]
    payload: Option<Value>,
}

/// POST /jobs
///
/// Records a job for the authenticated caller and queues it for processing.
/// Replies 201 with the pending record; the caller polls for the outcome.
async fn submit_job(
    user: CurrentUser,
    body: ValidatedJson<SubmitJobRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let payload = body
        .into_inner()
        .payload
        .filter(|payload| !payload.is_null())
        .ok_or_else(|| AppError::invalid(ErrorCode::ValidationError, "Payload is required"))?;

    let service = JobsService::new(app_state.store.clone(), app_state.queue.clone());
    let job = service.submit(&user.sub, payload).await?;

    Ok(HttpResponse::Created().json(JobResponse { job }))
}

/// GET /jobs/{job_id}
///
/// Returns one of the caller's jobs. Jobs owned by someone else read as 404.
async fn get_job(
    user: CurrentUser,
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let job_id = parse_job_id(&path.into_inner())?;

    let service = JobsService::new(app_state.store.clone(), app_state.queue.clone());
    let job = service.get(&user.sub, job_id).await?;

    Ok(HttpResponse::Ok().json(JobResponse { job }))
}

/// GET /jobs
///
/// Lists the caller's jobs, newest first.
async fn list_jobs(
    user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = JobsService::new(app_state.store.clone(), app_state.queue.clone());
    let jobs = service.list(&user.sub).await?;

    Ok(HttpResponse::Ok().json(JobListResponse { jobs }))
}

// An id that cannot exist reads the same as one that does not.
fn parse_job_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::job_not_found())
}

#[derive(serde::Serialize)]
struct JobResponse {
    job: Job,
}

#[derive(serde::Serialize)]
struct JobListResponse {
    jobs: Vec<Job>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::post().to(submit_job))
            .route(web::get().to(list_jobs)),
    );
    cfg.service(web::resource("/{job_id}").route(web::get().to(get_job)));
}
