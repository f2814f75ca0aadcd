//! Custom error types for Medscribe
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

use crate::core::types::Task;

/// Main error type for Medscribe operations
#[derive(Error, Debug)]
pub enum MedscribeError {
    /// Model provider connection or API errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// A single remote call did not finish in time
    #[error("{role} call timed out after {secs}s")]
    Timeout { role: Task, secs: u64 },

    /// Every attempt allowed by the retry policy failed
    #[error("{role} failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        role: Task,
        attempts: u32,
        #[source]
        source: Box<MedscribeError>,
    },

    /// A pipeline stage could not complete
    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: Task,
        #[source]
        source: Box<MedscribeError>,
    },

    /// Role name outside the known set
    #[error("Unknown agent role '{0}'")]
    UnknownRole(String),

    /// Agent was handed inputs for a different role
    #[error("{role} expects {expected} input")]
    InvalidInput { role: Task, expected: &'static str },

    /// A required task input was blank
    #[error("Input required: '{0}' must not be empty")]
    EmptyInput(&'static str),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Medscribe operations
pub type Result<T> = std::result::Result<T, MedscribeError>;

impl MedscribeError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a stage error, keeping the cause as the source
    pub fn stage(stage: Task, source: MedscribeError) -> Self {
        Self::StageFailed {
            stage,
            source: Box::new(source),
        }
    }

    /// Whether the error comes from the caller rather than the remote service.
    /// These are never retried.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::UnknownRole(_) | Self::InvalidInput { .. } | Self::EmptyInput(_)
        )
    }

    /// Innermost error in a `StageFailed`/`RetriesExhausted` chain
    pub fn root_cause(&self) -> &MedscribeError {
        match self {
            Self::StageFailed { source, .. } | Self::RetriesExhausted { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_stage_failure_keeps_cause() {
        let err = MedscribeError::stage(
            Task::Summarize,
            MedscribeError::RetriesExhausted {
                role: Task::Summarize,
                attempts: 3,
                source: Box::new(MedscribeError::provider("503 Service Unavailable")),
            },
        );

        let message = err.to_string();
        assert!(message.starts_with("summarize stage failed"));
        assert!(message.contains("3 attempt(s)"));
        assert!(err.source().is_some());
        assert!(matches!(err.root_cause(), MedscribeError::Provider(m) if m.contains("503")));
    }

    #[test]
    fn test_contract_violations() {
        assert!(MedscribeError::UnknownRole("x".into()).is_contract_violation());
        assert!(MedscribeError::EmptyInput("text").is_contract_violation());
        assert!(!MedscribeError::provider("down").is_contract_violation());
    }
}
