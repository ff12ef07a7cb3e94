//! Shared types for the admin generation pipeline
//!
//! Contains only truly shared types: the job record and its lifecycle,
//! the generation config submitted by callers, and logging setup.
//! Component-internal types stay in their respective crates.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
