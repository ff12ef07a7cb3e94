//! Job runner: owns the end-to-end batch loop
//!
//! The loop is sequential per job: a batch's provider call and the
//! corresponding progress update both complete before the next batch
//! starts. Distinct jobs run as independent loops over the shared job
//! store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::{assign_id, BatchGenerator, JobStore};
use crate::error::{PipelineError, PipelineResult};
use crate::services::SinkWriter;
use crate::traits::{DocumentStore, ModelProvider};
use shared::{GeneratedItem, GenerationConfig, JobId};

/// Cooperative cancellation flag, checked between batches
///
/// Provider calls are not preemptible; a cancelled job stops at the next
/// batch boundary and terminates as failed.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Job runner with dependency injection
pub struct JobRunner<P, S>
where
    P: ModelProvider,
    S: DocumentStore,
{
    jobs: JobStore,
    generator: BatchGenerator<P>,
    sink: SinkWriter<S>,
}

impl<P, S> JobRunner<P, S>
where
    P: ModelProvider,
    S: DocumentStore,
{
    pub fn new(jobs: JobStore, provider: Arc<P>, sink: SinkWriter<S>) -> Self {
        Self {
            jobs,
            generator: BatchGenerator::new(provider),
            sink,
        }
    }

    /// The job store shared with polling callers
    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    /// Validate the config and create a `queued` job record
    pub async fn submit(&self, config: &GenerationConfig) -> PipelineResult<JobId> {
        config.validate()?;
        let job_id = self.jobs.create(config.count).await;
        info!("Submitted job {job_id}: {} x{}", config.name, config.count);
        Ok(job_id)
    }

    /// Drive the batch loop to a terminal state
    ///
    /// Every exit path sets the job record to `completed` or `failed`;
    /// no error leaves the record non-terminal.
    pub async fn run(
        &self,
        job_id: JobId,
        config: &GenerationConfig,
        cancel: &CancelFlag,
    ) -> PipelineResult<()> {
        match self.execute(job_id, config, cancel).await {
            Ok(()) => {
                self.jobs.complete(job_id).await?;
                info!("Job {job_id} completed");
                Ok(())
            }
            Err(err) => {
                warn!("Job {job_id} failed: {err}");
                // Chunks committed before the failure stay persisted.
                self.jobs.fail(job_id, &err.to_string()).await?;
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        job_id: JobId,
        config: &GenerationConfig,
        cancel: &CancelFlag,
    ) -> PipelineResult<()> {
        self.jobs.mark_running(job_id).await?;

        let batches = config.batch_count();
        let mut items: Vec<GeneratedItem> = Vec::with_capacity(config.count as usize);

        for batch in 0..batches {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let produced = items.len() as u32;
            if produced >= config.count {
                break;
            }
            let needed = config.batch_size.min(config.count - produced);

            let outcome = self.generator.generate(config, needed).await?;
            if outcome.is_empty() {
                // Provider misbehavior; the loop is still capped at `batches`.
                warn!("Job {job_id}: batch {} yielded no items", batch + 1);
            }

            for data in outcome.into_items() {
                let index = items.len();
                let id = assign_id(&data, index);
                items.push(GeneratedItem { id, data });
            }

            let completed = (items.len() as u32).min(config.count);
            self.jobs
                .progress(job_id, completed, format!("Batch {}/{}", batch + 1, batches))
                .await?;
        }

        items.truncate(config.count as usize);
        self.sink.persist(config.sink, &config.collection, &items).await?;
        Ok(())
    }
}
