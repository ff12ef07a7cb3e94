//! Pipeline error types

use thiserror::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline error taxonomy
///
/// `Provider` and `Parse` are recoverable once per batch via the chat
/// fallback; everything else terminates the job that hits it.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {message}")]
    ConfigError { message: String },

    #[error("Provider request failed: {message}")]
    ProviderError { message: String },

    #[error("Response parse failed: {message}")]
    ParseError { message: String },

    #[error("Sink write failed: {message}")]
    SinkError { message: String },

    #[error("Job not found: {job_id}")]
    JobNotFound { job_id: String },

    #[error("Job cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether the chat-completion fallback may absorb this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::ProviderError { .. } | PipelineError::ParseError { .. }
        )
    }
}

impl From<shared::SharedError> for PipelineError {
    fn from(err: shared::SharedError) -> Self {
        let message = match err {
            shared::SharedError::InvalidConfig { field, value } => format!("{field} = {value}"),
            other => other.to_string(),
        };
        PipelineError::ConfigError { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_provider_and_parse_are_recoverable() {
        let provider = PipelineError::ProviderError {
            message: "schema rejected".to_string(),
        };
        let parse = PipelineError::ParseError {
            message: "not json".to_string(),
        };
        let sink = PipelineError::SinkError {
            message: "commit failed".to_string(),
        };

        assert!(provider.is_recoverable());
        assert!(parse.is_recoverable());
        assert!(!sink.is_recoverable());
        assert!(!PipelineError::Cancelled.is_recoverable());
    }
}
