//! Sink writer and store implementations
//!
//! The document-store path splits items into bounded chunks and commits
//! each chunk as one atomic merge-upsert batch; a chunk failure aborts
//! the remainder while earlier chunks stay persisted. The file path
//! writes the full item list as a single JSON artifact.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};
use crate::traits::DocumentStore;
use shared::{GeneratedItem, SinkKind};

/// Matches the document store's per-transaction write-count ceiling
pub const DEFAULT_CHUNK_SIZE: usize = 400;

/// Persists generated items to the configured sink
pub struct SinkWriter<S: DocumentStore> {
    store: Arc<S>,
    chunk_size: usize,
    output_dir: PathBuf,
}

impl<S: DocumentStore> SinkWriter<S> {
    pub fn new(store: Arc<S>, output_dir: PathBuf) -> Self {
        Self {
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
            output_dir,
        }
    }

    /// Override the chunk size; used by tests and store-specific tuning
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Persist the full item set to the configured sink
    ///
    /// Document-store writes are at-least-once, not atomic across the
    /// whole set: chunks committed before a failure remain persisted.
    pub async fn persist(
        &self,
        sink: SinkKind,
        namespace: &str,
        items: &[GeneratedItem],
    ) -> PipelineResult<()> {
        match sink {
            SinkKind::DocumentStore => self.persist_chunked(namespace, items).await,
            SinkKind::File => self.persist_file(namespace, items).await,
        }
    }

    async fn persist_chunked(&self, namespace: &str, items: &[GeneratedItem]) -> PipelineResult<()> {
        let chunk_count = items.len().div_ceil(self.chunk_size.max(1));
        for (index, chunk) in items.chunks(self.chunk_size).enumerate() {
            self.store.commit_batch(namespace, chunk).await?;
            debug!(
                "Committed chunk {}/{} ({} items) to {namespace}",
                index + 1,
                chunk_count,
                chunk.len()
            );
        }
        info!("Persisted {} items to collection {namespace}", items.len());
        Ok(())
    }

    async fn persist_file(&self, namespace: &str, items: &[GeneratedItem]) -> PipelineResult<()> {
        let file_name = format!("{}.json", sanitize_namespace(namespace));
        let path = self.output_dir.join(&file_name);

        fs::create_dir_all(&self.output_dir).await?;
        let body = serde_json::to_string_pretty(items)?;
        fs::write(&path, body).await?;

        info!("Wrote {} items to {}", items.len(), path.display());
        Ok(())
    }
}

/// Sanitize a collection name for use as a file name
fn sanitize_namespace(namespace: &str) -> String {
    namespace
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("_")
}

/// In-process document store with merge-upsert semantics
///
/// Stands in for the external document store in tests and local runs:
/// new fields overlay old, `updated_at` is refreshed on every write and
/// `created_at` is set only on first insert.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch one document by id
    pub async fn get(&self, namespace: &str, id: &str) -> Option<Value> {
        let collections = self.collections.lock().await;
        collections.get(namespace)?.get(id).cloned()
    }

    /// Number of documents in a collection
    pub async fn count(&self, namespace: &str) -> usize {
        let collections = self.collections.lock().await;
        collections.get(namespace).map(HashMap::len).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn commit_batch(&self, namespace: &str, items: &[GeneratedItem]) -> PipelineResult<()> {
        if items.len() > DEFAULT_CHUNK_SIZE {
            return Err(PipelineError::SinkError {
                message: format!(
                    "batch of {} items exceeds the {DEFAULT_CHUNK_SIZE}-write transaction ceiling",
                    items.len()
                ),
            });
        }

        let now = Utc::now().to_rfc3339();
        let mut collections = self.collections.lock().await;
        let collection = collections.entry(namespace.to_string()).or_default();

        for item in items {
            let incoming = match item.data.as_object() {
                Some(fields) => fields.clone(),
                None => {
                    let mut wrapped = serde_json::Map::new();
                    wrapped.insert("value".to_string(), item.data.clone());
                    wrapped
                }
            };

            let doc = collection
                .entry(item.id.clone())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if let Some(existing) = doc.as_object_mut() {
                for (key, value) in incoming {
                    existing.insert(key, value);
                }
                existing
                    .entry("created_at".to_string())
                    .or_insert_with(|| Value::String(now.clone()));
                existing.insert("updated_at".to_string(), Value::String(now.clone()));
            }
        }
        Ok(())
    }
}
