//! Core pipeline logic: generation, id assignment, job state, rate limiting

pub mod generator;
pub mod ident;
pub mod jobs;
pub mod limiter;

pub use generator::{parse_items, render_user_prompt, resolve_model, BatchGenerator, GenerationOutcome};
pub use ident::{assign_id, normalize_id};
pub use jobs::JobStore;
pub use limiter::{client_key, RateLimitDecision, RateLimiter};
