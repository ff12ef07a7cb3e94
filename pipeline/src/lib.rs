//! Batch content-generation pipeline
//!
//! Drives an LLM provider through sequential request batches, validates
//! output against a declared JSON schema with a chat-completion fallback,
//! assigns stable deduplicated document ids, and persists results to a
//! pluggable sink in bounded-size chunks. Job progress is tracked in a
//! polling-friendly job record store; a per-key sliding-window rate
//! limiter protects the entry points.

pub mod core;
pub mod error;
pub mod runner;
pub mod services;
pub mod traits;

// Re-export main types
pub use crate::core::{
    assign_id, client_key, normalize_id, parse_items, render_user_prompt, resolve_model,
    BatchGenerator, GenerationOutcome, JobStore, RateLimitDecision, RateLimiter,
};
pub use error::{PipelineError, PipelineResult};
pub use runner::{CancelFlag, JobRunner};
pub use services::{HttpModelProvider, MemoryStore, SinkWriter, DEFAULT_CHUNK_SIZE};
pub use traits::{DocumentStore, ModelProvider};
