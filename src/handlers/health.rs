// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Simple endpoint to verify service status

use crate::db::JobStore;
use crate::services::JobCoordinator;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub async fn health_check<S: JobStore>(coordinator: web::Data<JobCoordinator<S>>) -> impl Responder {
    if coordinator.is_shut_down() {
        return HttpResponse::ServiceUnavailable().json(json!({
            "status": "shutting_down",
            "service": "search-jobs",
        }));
    }

    let poll_interval_ms =
        u64::try_from(coordinator.poll_interval().as_millis()).unwrap_or(u64::MAX);
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "search-jobs",
        "version": env!("CARGO_PKG_VERSION"),
        "poll_interval_ms": poll_interval_ms,
    }))
}

pub fn config<S: JobStore>(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check::<S>));
}
