//! Webserver for the admin generation pipeline
//!
//! Thin axum surface over the core: job submission, job polling, and a
//! liveness endpoint, each behind its own rate limiter instance.

pub mod error;
pub mod handlers;
pub mod state;

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::debug;

use pipeline::traits::{DocumentStore, ModelProvider};
use pipeline::RateLimiter;

pub use error::{WebServerError, WebServerResult};
pub use state::AppState;

/// Build the API router over the given state
pub fn build_router<P, S>(state: AppState<P, S>) -> Router
where
    P: ModelProvider + 'static,
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/api/generate", post(handlers::submit_job::<P, S>))
        .route("/api/jobs/:id", get(handlers::get_job::<P, S>))
        .route("/api/status", get(handlers::get_status::<P, S>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Periodically discard elapsed rate-limit windows to bound memory
pub fn spawn_limiter_sweep(
    limiters: Vec<std::sync::Arc<RateLimiter>>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            for limiter in &limiters {
                limiter.sweep().await;
                debug!("Limiter sweep done, {} live buckets", limiter.entry_count().await);
            }
        }
    })
}
