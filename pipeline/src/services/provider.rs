//! HTTP model provider client
//!
//! Speaks the OpenAI-compatible chat completions API. The structured
//! path attaches a `json_schema` response format; the chat path sends a
//! plain completion with an explicit sampling temperature.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::traits::ModelProvider;
use shared::JsonSchemaSpec;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider client backed by reqwest
pub struct HttpModelProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpModelProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Point the client at a different endpoint; used against local stubs
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn post_completion(&self, body: serde_json::Value) -> PipelineResult<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::ProviderError {
                message: format!("network error: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match status.as_u16() {
                401 => "authentication failed".to_string(),
                429 => "provider rate limit exceeded".to_string(),
                503 => "service unavailable".to_string(),
                code => format!("server error: HTTP {code}"),
            };
            return Err(PipelineError::ProviderError { message });
        }

        let response_json: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| PipelineError::ProviderError {
                    message: format!("failed to parse response body: {e}"),
                })?;

        let content = response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| PipelineError::ProviderError {
                message: "no content in response".to_string(),
            })?;

        debug!("Provider returned {} bytes of content", content.len());
        Ok(content.to_string())
    }
}

#[async_trait]
impl ModelProvider for HttpModelProvider {
    async fn complete_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &JsonSchemaSpec,
        model: &str,
    ) -> PipelineResult<String> {
        let body = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.schema,
                    "strict": schema.strict
                }
            }
        });

        self.post_completion(body).await
    }

    async fn complete_chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        temperature: f32,
    ) -> PipelineResult<String> {
        let body = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": temperature
        });

        self.post_completion(body).await
    }
}
