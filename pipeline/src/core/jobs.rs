//! Job record store
//!
//! Keyed by job id; supports concurrent independent updates so multiple
//! jobs can run as independent sequential loops. The job runner is the
//! sole writer; terminal states are set exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{PipelineError, PipelineResult};
use shared::{JobId, JobRecord, JobStatus};

/// In-memory job record store
#[derive(Clone, Default)]
pub struct JobStore {
    records: Arc<RwLock<HashMap<JobId, JobRecord>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh record in `queued` state and return its id
    pub async fn create(&self, total: u32) -> JobId {
        let id = JobId::new();
        let mut records = self.records.write().await;
        records.insert(id, JobRecord::new(id, total));
        id
    }

    /// Current record for a job, if it exists
    pub async fn get(&self, id: JobId) -> Option<JobRecord> {
        let records = self.records.read().await;
        records.get(&id).cloned()
    }

    /// Transition a queued job to `running`
    pub async fn mark_running(&self, id: JobId) -> PipelineResult<()> {
        self.update(id, |record| {
            record.status = JobStatus::Running;
        })
        .await
    }

    /// Record progress after a batch
    pub async fn progress(&self, id: JobId, completed: u32, message: String) -> PipelineResult<()> {
        self.update(id, |record| {
            record.completed = completed.min(record.total);
            record.message = Some(message);
        })
        .await
    }

    /// Mark a job `completed`; a no-op if a terminal state was already set
    pub async fn complete(&self, id: JobId) -> PipelineResult<()> {
        self.update(id, |record| {
            if !record.status.is_terminal() {
                record.status = JobStatus::Completed;
            }
        })
        .await
    }

    /// Mark a job `failed` with an error message; terminal state wins once
    pub async fn fail(&self, id: JobId, error: &str) -> PipelineResult<()> {
        self.update(id, |record| {
            if !record.status.is_terminal() {
                record.status = JobStatus::Failed;
                record.error = Some(error.to_string());
            }
        })
        .await
    }

    async fn update<F>(&self, id: JobId, apply: F) -> PipelineResult<()>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(PipelineError::JobNotFound {
            job_id: id.to_string(),
        })?;
        apply(record);
        record.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = JobStore::new();
        let id = store.create(25).await;

        let record = store.get(id).await.unwrap();
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.total, 25);
        assert_eq!(record.completed, 0);
    }

    #[tokio::test]
    async fn test_unknown_job_is_none() {
        let store = JobStore::new();
        assert!(store.get(JobId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_update_of_unknown_job_errors() {
        let store = JobStore::new();
        let result = store.mark_running(JobId::new()).await;
        assert!(matches!(result, Err(PipelineError::JobNotFound { .. })));
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let store = JobStore::new();
        let id = store.create(10).await;

        store.mark_running(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().status, JobStatus::Running);

        store.progress(id, 5, "Batch 1/2".to_string()).await.unwrap();
        let record = store.get(id).await.unwrap();
        assert_eq!(record.completed, 5);
        assert_eq!(record.message.as_deref(), Some("Batch 1/2"));

        store.complete(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_progress_capped_at_total() {
        let store = JobStore::new();
        let id = store.create(10).await;

        store.progress(id, 99, "Batch 1/1".to_string()).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().completed, 10);
    }

    #[tokio::test]
    async fn test_terminal_state_set_exactly_once() {
        let store = JobStore::new();
        let id = store.create(10).await;

        store.fail(id, "provider exploded").await.unwrap();
        store.complete(id).await.unwrap();

        let record = store.get(id).await.unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("provider exploded"));
    }

    #[tokio::test]
    async fn test_updated_at_is_monotonic() {
        let store = JobStore::new();
        let id = store.create(10).await;
        let created = store.get(id).await.unwrap().updated_at;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.mark_running(id).await.unwrap();
        let after_running = store.get(id).await.unwrap().updated_at;
        assert!(after_running > created);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.progress(id, 3, "Batch 1/4".to_string()).await.unwrap();
        assert!(store.get(id).await.unwrap().updated_at > after_running);
    }

    #[tokio::test]
    async fn test_concurrent_jobs_are_independent() {
        let store = JobStore::new();
        let first = store.create(5).await;
        let second = store.create(8).await;

        store.mark_running(first).await.unwrap();
        store.fail(second, "bad batch").await.unwrap();

        assert_eq!(store.get(first).await.unwrap().status, JobStatus::Running);
        assert_eq!(store.get(second).await.unwrap().status, JobStatus::Failed);
    }
}
