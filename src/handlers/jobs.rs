// src/handlers/jobs.rs
// DOCUMENTATION: HTTP handlers for search job operations
// PURPOSE: Parse requests, call the job coordinator, return responses

use crate::db::JobStore;
use crate::errors::ApiError;
use crate::models::{
    status_label, CancelJobQuery, CancelJobResponse, JobStatus, JobStatusResponse,
    SubmitJobResponse,
};
use crate::services::JobCoordinator;
use actix_web::{web, HttpResponse, Responder};
use serde_json::Value;

/// POST /jobs
/// Submit a search job; the body is the search config
pub async fn submit_job<S: JobStore>(
    coordinator: web::Data<JobCoordinator<S>>,
    body: web::Json<Value>,
) -> Result<impl Responder, ApiError> {
    let search_config = body.into_inner();
    if !search_config.is_object() {
        return Err(ApiError::InvalidInput(
            "search config must be a JSON object".to_string(),
        ));
    }

    let job_id = coordinator.submit_query(&search_config).await?;
    Ok(HttpResponse::Created().json(SubmitJobResponse { job_id }))
}

/// GET /jobs/{id}
/// Job row including its decoded search config
pub async fn get_job<S: JobStore>(
    coordinator: web::Data<JobCoordinator<S>>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let job_id = path.into_inner();
    let job = coordinator
        .fetch_job(job_id)
        .await?
        .ok_or(ApiError::NotFound(job_id))?;
    Ok(HttpResponse::Ok().json(job.to_response()?))
}

/// GET /jobs/{id}/status
/// One-shot status read
pub async fn get_job_status<S: JobStore>(
    coordinator: web::Data<JobCoordinator<S>>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let job_id = path.into_inner();
    let code = coordinator
        .job_status(job_id)
        .await?
        .ok_or(ApiError::NotFound(job_id))?;
    Ok(HttpResponse::Ok().json(JobStatusResponse {
        job_id,
        status: status_label(code),
        code,
    }))
}

/// POST /jobs/{id}/cancel
/// Request cancellation; `?only_pending=true` leaves already-running jobs alone
pub async fn cancel_job<S: JobStore>(
    coordinator: web::Data<JobCoordinator<S>>,
    path: web::Path<i64>,
    query: web::Query<CancelJobQuery>,
) -> Result<impl Responder, ApiError> {
    let job_id = path.into_inner();
    let requested = if query.only_pending {
        coordinator.cancel_if_pending(job_id).await?
    } else {
        coordinator.submit_query_cancellation(job_id).await?;
        true
    };
    Ok(HttpResponse::Accepted().json(CancelJobResponse { job_id, requested }))
}

/// GET /jobs/{id}/wait
/// Block until the job finishes. Dropping the connection stops the wait
/// without touching the job.
pub async fn wait_job<S: JobStore>(
    coordinator: web::Data<JobCoordinator<S>>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let job_id = path.into_inner();
    coordinator.await_job_completion(job_id).await?;
    Ok(HttpResponse::Ok().json(JobStatusResponse {
        job_id,
        status: JobStatus::Succeeded.to_string(),
        code: JobStatus::Succeeded.code(),
    }))
}

/// Configuration for job routes
pub fn config<S: JobStore>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/jobs")
            .route("", web::post().to(submit_job::<S>))
            .route("/{id}", web::get().to(get_job::<S>))
            .route("/{id}/status", web::get().to(get_job_status::<S>))
            .route("/{id}/cancel", web::post().to(cancel_job::<S>))
            .route("/{id}/wait", web::get().to(wait_job::<S>)),
    );
}
