//! Schema-constrained batch generation with chat fallback
//!
//! The primary path asks the provider for output conforming to the job's
//! JSON schema. If that call fails (provider rejection or unparsable
//! output), a single free-form chat completion is attempted with an
//! explicit "JSON array only" instruction. Only exhaustion of both paths
//! surfaces an error to the job runner.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::traits::ModelProvider;
use shared::GenerationConfig;

/// Sampling temperature for the fallback chat completion
const FALLBACK_TEMPERATURE: f32 = 0.7;

/// Concrete provider model used when a logical name is unknown
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Fixed logical-name to provider-model table
const MODEL_TABLE: &[(&str, &str)] = &[
    ("small", "gpt-4o-mini"),
    ("large", "gpt-4o"),
    ("reasoning", "o3-mini"),
];

/// Resolve a logical model name to a concrete provider model
///
/// Unknown names map to the default small model rather than erroring;
/// availability over strictness.
pub fn resolve_model(logical: &str) -> &'static str {
    MODEL_TABLE
        .iter()
        .find(|(name, _)| *name == logical)
        .map(|(_, model)| *model)
        .unwrap_or(DEFAULT_MODEL)
}

/// Substitute the `{count}` placeholder with the batch's requested size
pub fn render_user_prompt(template: &str, needed: u32) -> String {
    template.replace("{count}", &needed.to_string())
}

/// Which generation path produced a batch
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Schema-constrained call succeeded
    Structured(Vec<Value>),
    /// Primary call failed; chat fallback succeeded
    Fallback(Vec<Value>),
}

impl GenerationOutcome {
    pub fn into_items(self) -> Vec<Value> {
        match self {
            GenerationOutcome::Structured(items) | GenerationOutcome::Fallback(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            GenerationOutcome::Structured(items) | GenerationOutcome::Fallback(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drives one provider call per batch, with the fallback strategy inside
pub struct BatchGenerator<P: ModelProvider> {
    provider: Arc<P>,
}

impl<P: ModelProvider> BatchGenerator<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Generate one batch of up to `needed` items
    pub async fn generate(
        &self,
        config: &GenerationConfig,
        needed: u32,
    ) -> PipelineResult<GenerationOutcome> {
        let user_prompt = render_user_prompt(&config.user_prompt, needed);
        let model = resolve_model(&config.model);

        match self.try_structured(config, &user_prompt, model).await {
            Ok(items) => Ok(GenerationOutcome::Structured(items)),
            Err(err) if err.is_recoverable() => {
                warn!("Structured generation failed, trying chat fallback: {err}");
                let items = self.try_fallback(config, &user_prompt, model).await?;
                Ok(GenerationOutcome::Fallback(items))
            }
            Err(err) => Err(err),
        }
    }

    async fn try_structured(
        &self,
        config: &GenerationConfig,
        user_prompt: &str,
        model: &str,
    ) -> PipelineResult<Vec<Value>> {
        let text = self
            .provider
            .complete_structured(&config.system_prompt, user_prompt, &config.json_schema, model)
            .await?;
        let items = parse_items(&text)?;
        debug!("Structured call returned {} items", items.len());
        Ok(items)
    }

    async fn try_fallback(
        &self,
        config: &GenerationConfig,
        user_prompt: &str,
        model: &str,
    ) -> PipelineResult<Vec<Value>> {
        let fallback_prompt = format!(
            "{user_prompt}\n\nReturn a JSON array only, with no surrounding prose."
        );
        let text = self
            .provider
            .complete_chat(
                &config.system_prompt,
                &fallback_prompt,
                model,
                FALLBACK_TEMPERATURE,
            )
            .await?;
        let items = parse_items(&text)?;
        debug!("Fallback call returned {} items", items.len());
        Ok(items)
    }
}

/// Parse provider text into a list of item payloads
///
/// A non-array top level is wrapped in a one-element array: a provider may
/// legitimately return a single object when one item was requested.
pub fn parse_items(text: &str) -> PipelineResult<Vec<Value>> {
    let cleaned = extract_json(text);
    let value: Value =
        serde_json::from_str(cleaned.trim()).map_err(|e| PipelineError::ParseError {
            message: format!("provider output is not valid JSON: {e}"),
        })?;

    match value {
        Value::Array(items) => Ok(items),
        other => Ok(vec![other]),
    }
}

/// Strip markdown code fences and surrounding prose from provider output
fn extract_json(text: &str) -> String {
    static FENCE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence regex is valid")
    });

    // Fenced block wins when present
    if let Some(caps) = fence.captures(text) {
        if let Some(inner) = caps.get(1) {
            return inner.as_str().to_string();
        }
    }

    // Otherwise slice from the first bracket to its matching last bracket
    let trimmed = text.trim();
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if start < end {
                return trimmed[start..=end].to_string();
            }
        }
    }

    trimmed.to_string()
}
