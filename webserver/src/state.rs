//! Shared application state for request handlers

use std::sync::Arc;
use std::time::Duration;

use pipeline::traits::{DocumentStore, ModelProvider};
use pipeline::{JobRunner, RateLimiter};

/// Default ceilings: generation is capped more conservatively than reads
pub const DEFAULT_GENERATION_LIMIT: u32 = 5;
pub const DEFAULT_READ_LIMIT: u32 = 60;
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// State handed to every handler
///
/// Each endpoint family owns its own limiter instance; both are injected
/// here rather than living in process-wide statics so tests can isolate
/// them.
pub struct AppState<P, S>
where
    P: ModelProvider,
    S: DocumentStore,
{
    pub runner: Arc<JobRunner<P, S>>,
    pub generation_limiter: Arc<RateLimiter>,
    pub read_limiter: Arc<RateLimiter>,
}

impl<P, S> Clone for AppState<P, S>
where
    P: ModelProvider,
    S: DocumentStore,
{
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            generation_limiter: Arc::clone(&self.generation_limiter),
            read_limiter: Arc::clone(&self.read_limiter),
        }
    }
}

impl<P, S> AppState<P, S>
where
    P: ModelProvider,
    S: DocumentStore,
{
    pub fn new(
        runner: JobRunner<P, S>,
        generation_limiter: RateLimiter,
        read_limiter: RateLimiter,
    ) -> Self {
        Self {
            runner: Arc::new(runner),
            generation_limiter: Arc::new(generation_limiter),
            read_limiter: Arc::new(read_limiter),
        }
    }

    /// State with the default per-endpoint limits
    pub fn with_default_limits(runner: JobRunner<P, S>) -> Self {
        let window = Duration::from_secs(DEFAULT_WINDOW_SECS);
        Self::new(
            runner,
            RateLimiter::new(DEFAULT_GENERATION_LIMIT, window),
            RateLimiter::new(DEFAULT_READ_LIMIT, window),
        )
    }
}
