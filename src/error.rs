//! Error types for the AutoAnki flashcard workflow.

use crate::workflow::WorkflowStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure category reported by a text generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Unauthorized,
    NotFound,
    RateLimited,
    Unavailable,
    MalformedResponse,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Unauthorized => "unauthorized",
            ProviderErrorKind::NotFound => "not_found",
            ProviderErrorKind::RateLimited => "rate_limited",
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::MalformedResponse => "malformed_response",
        }
    }

    /// Kinds worth retrying inside the provider layer
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimited | ProviderErrorKind::Unavailable
        )
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a [`crate::provider::TextGenerator`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} from {provider}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub provider: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        kind: ProviderErrorKind,
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::MalformedResponse, provider, message)
    }

    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, provider, message)
    }
}

/// Failure produced while a stage runs. Always converted into a failed
/// [`crate::workflow::WorkflowState`]; never crosses the orchestrator boundary.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("invalid flashcard format: {reason}")]
    Parse { reason: String, raw: String },

    #[error("{detail}")]
    Precondition { stage: &'static str, detail: String },

    #[error("{stage} timed out after {timeout:?}")]
    Timeout {
        stage: &'static str,
        timeout: std::time::Duration,
    },
}

impl StageError {
    pub fn parse(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        StageError::Parse {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub fn precondition(stage: &'static str, detail: impl Into<String>) -> Self {
        StageError::Precondition {
            stage,
            detail: detail.into(),
        }
    }

    /// Raw model output attached to parse failures
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            StageError::Parse { raw, .. } => Some(raw.as_str()),
            _ => None,
        }
    }
}

/// Illegal mutation of a workflow state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("workflow already finished with status {0}")]
    Terminal(WorkflowStatus),

    #[error("cannot move workflow from {from} to {to}")]
    IllegalTransition {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },

    #[error("invalid state content: {0}")]
    InvalidContent(String),

    #[error("state invariant violated: {0}")]
    Invariant(String),
}

/// Errors surfaced by configuration, provider construction and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}
