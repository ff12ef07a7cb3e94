//! Collaborator trait definitions for dependency injection

use async_trait::async_trait;

use crate::error::PipelineResult;
use shared::{GeneratedItem, JsonSchemaSpec};

/// LLM provider client
///
/// The pipeline calls this with a system/user prompt pair and either a
/// JSON-schema constraint or a free-form completion request; it never
/// implements the transport itself.
#[mockall::automock]
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Request output constrained to the supplied JSON schema
    async fn complete_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &JsonSchemaSpec,
        model: &str,
    ) -> PipelineResult<String>;

    /// Plain chat-style completion at an explicit sampling temperature
    async fn complete_chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        temperature: f32,
    ) -> PipelineResult<String>;
}

/// Document store client capable of atomic merge-upsert batches
///
/// One `commit_batch` call is one atomic write: every item in it is
/// upserted by id with merge semantics, or none are.
#[mockall::automock]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn commit_batch(&self, namespace: &str, items: &[GeneratedItem]) -> PipelineResult<()>;
}
