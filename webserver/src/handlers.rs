//! REST API handlers
//!
//! Submit and poll endpoints for generation jobs, each behind its own
//! rate limiter. HTTP status mapping lives here; the limiter itself only
//! reports decisions.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde_json::{json, Value};
use tracing::error;

use crate::error::{WebServerError, WebServerResult};
use crate::state::AppState;
use pipeline::traits::{DocumentStore, ModelProvider};
use pipeline::{client_key, CancelFlag};
use shared::{GenerationConfig, JobId};

/// Derive the caller identity from forwarding headers
fn header_client_key(headers: &HeaderMap) -> String {
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok());
    let real_ip = headers.get("x-real-ip").and_then(|v| v.to_str().ok());
    client_key(forwarded_for, real_ip)
}

/// Submit a generation job - POST /api/generate
///
/// Validates the config, creates the job record, and spawns the batch
/// loop on the runtime; callers poll the returned job id.
pub async fn submit_job<P, S>(
    State(state): State<AppState<P, S>>,
    headers: HeaderMap,
    Json(config): Json<GenerationConfig>,
) -> WebServerResult<(StatusCode, Json<Value>)>
where
    P: ModelProvider + 'static,
    S: DocumentStore + 'static,
{
    let key = header_client_key(&headers);
    let decision = state.generation_limiter.check(&key).await;
    if !decision.allowed {
        return Err(WebServerError::RateLimited {
            reset_at: decision.reset_at,
        });
    }

    let job_id = state.runner.submit(&config).await?;

    let runner = std::sync::Arc::clone(&state.runner);
    let cancel = CancelFlag::new();
    tokio::spawn(async move {
        // run() records the terminal state itself; the error here is
        // already reflected in the job record.
        if let Err(err) = runner.run(job_id, &config, &cancel).await {
            error!("Job {job_id} terminated with error: {err}");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"job_id": job_id, "remaining": decision.remaining})),
    ))
}

/// Poll a job record - GET /api/jobs/{id}
pub async fn get_job<P, S>(
    State(state): State<AppState<P, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> WebServerResult<Json<Value>>
where
    P: ModelProvider + 'static,
    S: DocumentStore + 'static,
{
    let key = header_client_key(&headers);
    let decision = state.read_limiter.check(&key).await;
    if !decision.allowed {
        return Err(WebServerError::RateLimited {
            reset_at: decision.reset_at,
        });
    }

    let job_id = JobId::from_string(&id).map_err(|_| WebServerError::BadRequest {
        message: format!("invalid job id: {id}"),
    })?;

    let record = state
        .runner
        .jobs()
        .get(job_id)
        .await
        .ok_or(WebServerError::NotFound { job_id: id })?;

    Ok(Json(json!({"status": "ok", "data": record})))
}

/// Liveness summary - GET /api/status
pub async fn get_status<P, S>(State(state): State<AppState<P, S>>) -> Json<Value>
where
    P: ModelProvider + 'static,
    S: DocumentStore + 'static,
{
    let live_buckets =
        state.generation_limiter.entry_count().await + state.read_limiter.entry_count().await;

    Json(json!({
        "status": "ok",
        "data": {
            "server_status": "running",
            "live_rate_limit_buckets": live_buckets,
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}
