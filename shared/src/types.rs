//! Core shared types and identifiers

use crate::errors::{SharedError, SharedResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for generation jobs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> SharedResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SharedError::InvalidJobId { input: s.to_string() })
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistence destination for generated items
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    DocumentStore,
    File,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::DocumentStore => write!(f, "document-store"),
            SinkKind::File => write!(f, "file"),
        }
    }
}

/// JSON schema constraint passed to the model provider
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonSchemaSpec {
    pub name: String,
    pub schema: serde_json::Value,
    #[serde(default)]
    pub strict: bool,
}

/// Configuration for one generation job, immutable once submitted
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Human-readable job name
    pub name: String,
    /// Total number of items to produce
    pub count: u32,
    /// Items requested per provider call
    pub batch_size: u32,
    pub system_prompt: String,
    /// May contain a `{count}` placeholder, substituted per batch
    pub user_prompt: String,
    pub json_schema: JsonSchemaSpec,
    /// Sink namespace (collection name for the document store)
    pub collection: String,
    pub sink: SinkKind,
    /// Logical model name, resolved to a concrete provider model
    pub model: String,
}

impl GenerationConfig {
    /// Validate invariants before a job record is created
    pub fn validate(&self) -> SharedResult<()> {
        if self.name.trim().is_empty() {
            return Err(SharedError::InvalidConfig {
                field: "name".to_string(),
                value: self.name.clone(),
            });
        }
        if self.count == 0 {
            return Err(SharedError::InvalidConfig {
                field: "count".to_string(),
                value: self.count.to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(SharedError::InvalidConfig {
                field: "batch_size".to_string(),
                value: self.batch_size.to_string(),
            });
        }
        if self.collection.trim().is_empty() {
            return Err(SharedError::InvalidConfig {
                field: "collection".to_string(),
                value: self.collection.clone(),
            });
        }
        if self.json_schema.name.trim().is_empty() {
            return Err(SharedError::InvalidConfig {
                field: "json_schema.name".to_string(),
                value: self.json_schema.name.clone(),
            });
        }
        Ok(())
    }

    /// Number of provider batches needed to reach `count`
    pub fn batch_count(&self) -> u32 {
        self.count.div_ceil(self.batch_size)
    }
}

/// One generated item: an opaque payload plus its derived document id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratedItem {
    pub id: String,
    pub data: serde_json::Value,
}

/// Lifecycle status of a generation job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of one job as exposed to polling callers
///
/// The job runner is the sole writer; everyone else only reads.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    /// Items produced so far, capped at `total`
    pub completed: u32,
    /// Target item count
    pub total: u32,
    /// Human-readable progress note, e.g. "Batch 3/10"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a fresh record in `queued` state
    pub fn new(id: JobId, total: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Queued,
            completed: 0,
            total,
            message: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`; called on every state change
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_config() -> GenerationConfig {
        GenerationConfig {
            name: "affirmations".to_string(),
            count: 25,
            batch_size: 10,
            system_prompt: "You generate wellness content.".to_string(),
            user_prompt: "Generate {count} affirmations".to_string(),
            json_schema: JsonSchemaSpec {
                name: "affirmation_list".to_string(),
                schema: json!({"type": "array"}),
                strict: true,
            },
            collection: "affirmations".to_string(),
            sink: SinkKind::DocumentStore,
            model: "small".to_string(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_zero_count_rejected() {
        let mut config = valid_config();
        config.count = 0;
        assert!(matches!(
            config.validate(),
            Err(SharedError::InvalidConfig { field, .. }) if field == "count"
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = valid_config();
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_collection_rejected() {
        let mut config = valid_config();
        config.collection = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_count_rounds_up() {
        let mut config = valid_config();
        assert_eq!(config.batch_count(), 3); // 25 / 10

        config.count = 20;
        assert_eq!(config.batch_count(), 2);

        config.count = 1;
        config.batch_size = 10;
        assert_eq!(config.batch_count(), 1);
    }

    #[test]
    fn test_job_record_starts_queued() {
        let record = JobRecord::new(JobId::new(), 25);
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.completed, 0);
        assert_eq!(record.total, 25);
        assert!(record.error.is_none());
        assert!(!record.status.is_terminal());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_sink_kind_serde_is_kebab_case() {
        assert_eq!(
            serde_json::to_string(&SinkKind::DocumentStore).unwrap(),
            "\"document-store\""
        );
        assert_eq!(serde_json::to_string(&SinkKind::File).unwrap(), "\"file\"");
    }

    #[test]
    fn test_job_id_round_trip() {
        let id = JobId::new();
        let parsed = JobId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_job_id_rejects_garbage() {
        assert!(JobId::from_string("not-a-uuid").is_err());
    }
}
