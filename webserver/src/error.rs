//! Webserver error types and HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

use pipeline::PipelineError;

#[derive(Error, Debug)]
pub enum WebServerError {
    #[error("Rate limit exceeded")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("Job not found: {job_id}")]
    NotFound { job_id: String },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

pub type WebServerResult<T> = Result<T, WebServerError>;

impl IntoResponse for WebServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            WebServerError::RateLimited { reset_at } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({"error": "rate limit exceeded", "reset_at": reset_at}),
            ),
            WebServerError::NotFound { job_id } => (
                StatusCode::NOT_FOUND,
                json!({"error": format!("job not found: {job_id}")}),
            ),
            WebServerError::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, json!({"error": message}))
            }
            WebServerError::Pipeline(err) => {
                let status = match err {
                    PipelineError::ConfigError { .. } => StatusCode::BAD_REQUEST,
                    PipelineError::JobNotFound { .. } => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, json!({"error": err.to_string()}))
            }
        };
        (status, Json(body)).into_response()
    }
}
