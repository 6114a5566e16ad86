//! CLI output: command results and error mapping to a stable CLI surface.

use crate::error::ApiError;

/// Rendered command result. `success` drives the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub body: String,
    pub success: bool,
}

impl CommandOutput {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            success: true,
        }
    }

    pub fn failed(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            success: false,
        }
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ProviderNotConfigured(msg) => format!(
            "Provider not configured: {}\nRun 'autoanki config validate' for details.",
            msg
        ),
        other => other.to_string(),
    }
}
