//! Service implementations behind the collaborator traits

pub mod provider;
pub mod sink;

pub use provider::HttpModelProvider;
pub use sink::{MemoryStore, SinkWriter, DEFAULT_CHUNK_SIZE};
