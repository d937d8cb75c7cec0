// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for pool lifecycle, job coordination and HTTP

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Errors raised while bringing up or tearing down the process-wide pool
/// DOCUMENTATION: All variants are fatal to start-up, none are retried
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to initialize database pool: {0}")]
    Initialization(#[source] sqlx::Error),

    #[error("Database pool is already initialized")]
    DoubleInitialization,

    #[error("Invalid database configuration: {0}")]
    InvalidConfig(String),
}

/// Errors surfaced by the job coordinator
/// DOCUMENTATION: Store errors from submit/cancel are passed through unmodified,
/// polling failures are wrapped with the job they were observed for
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] sqlx::Error),

    #[error("Failed to query status of search job {job_id}: {source}")]
    StatusQuery {
        job_id: i64,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to encode search config: {0}")]
    Encoding(String),

    #[error("Failed to decode search config: {0}")]
    Decoding(String),

    #[error("Search job not found with id: {0}")]
    JobNotFound(i64),

    #[error("Search job {0} was cancelled")]
    JobCancelled(i64),

    #[error("Search job {job_id} finished with unexpected status code {code}")]
    UnexpectedJobStatus { job_id: i64, code: i16 },

    #[error("Stopped waiting for search job {0}")]
    WaitAbandoned(i64),

    #[error("Job coordinator has been shut down")]
    ShutDown,
}

/// Application-specific HTTP error types
/// DOCUMENTATION: Each variant maps to appropriate HTTP status code and error response
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Search job not found with id: {0}")]
    NotFound(i64),

    #[error("Search job {0} was cancelled")]
    Cancelled(i64),

    #[error("Search job {job_id} finished with unexpected status code {code}")]
    UnexpectedStatus { job_id: i64, code: i16 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::JobNotFound(id) => ApiError::NotFound(id),
            JobError::JobCancelled(id) => ApiError::Cancelled(id),
            JobError::UnexpectedJobStatus { job_id, code } => {
                ApiError::UnexpectedStatus { job_id, code }
            }
            JobError::Encoding(msg) => ApiError::InvalidInput(msg),
            JobError::Store(_) | JobError::StatusQuery { .. } => {
                ApiError::DatabaseError(err.to_string())
            }
            JobError::ShutDown | JobError::WaitAbandoned(_) => ApiError::ServiceUnavailable,
            JobError::Decoding(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Cancelled(_) => "JOB_CANCELLED",
            ApiError::UnexpectedStatus { .. } => "UNEXPECTED_JOB_STATUS",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

/// Convert ApiError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });
        if let ApiError::UnexpectedStatus { code, .. } = self {
            body["error"]["status_code"] = json!(code);
        }

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Cancelled(_) => StatusCode::CONFLICT,
            ApiError::UnexpectedStatus { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
