//! Configuration System
//!
//! Layered configuration built with the `config` crate. Sources, lowest to
//! highest precedence: merge-policy defaults, the global user file, workspace
//! files (`config/config.toml`, `config/{AUTOANKI_ENV}.toml`), then
//! `AUTOANKI__SECTION__KEY` environment variables.

use crate::agent::PromptTemplates;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::{BackendConfig, GenerationOptions, RetryPolicy};
use crate::workflow::CardCountPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

mod merge;
mod sources;

pub use merge::DEFAULT_MODEL;
pub use sources::environment::{ENV_PREFIX, ENV_SEPARATOR};
pub use sources::workspace_file::ENV_NAME_VAR;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoAnkiConfig {
    /// Text generation backend
    #[serde(default)]
    pub backend: BackendConfig,

    /// Model used when a request names none
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling options sent with every generation call
    #[serde(default)]
    pub generation: GenerationOptions,

    /// Backoff for transient provider errors
    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub workflow: WorkflowSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for AutoAnkiConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            default_model: default_model(),
            generation: GenerationOptions::default(),
            retry: RetryPolicy::default(),
            workflow: WorkflowSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Per-stage deadline; unset or zero disables it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_timeout_secs: Option<u64>,

    /// Accepted flashcard count range
    pub cards: CardCountPolicy,

    pub prompts: PromptTemplates,
}

impl WorkflowSettings {
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.cards.validate()?;
        self.prompts.validate()
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Backend: {0}")]
    Backend(String),
    #[error("Model: {0}")]
    Model(String),
    #[error("Generation: {0}")]
    Generation(String),
    #[error("Retry: {0}")]
    Retry(String),
    #[error("Workflow: {0}")]
    Workflow(String),
    #[error("Logging: {0}")]
    Logging(String),
}

impl AutoAnkiConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.backend.validate() {
            errors.push(ValidationError::Backend(e));
        }
        if self.default_model.trim().is_empty() {
            errors.push(ValidationError::Model(
                "default_model cannot be empty".to_string(),
            ));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.retry.validate() {
            errors.push(ValidationError::Retry(e));
        }
        if let Err(e) = self.workflow.validate() {
            errors.push(ValidationError::Workflow(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding all problems into one error
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Copy safe to print
    pub fn redacted(&self) -> Self {
        Self {
            backend: self.backend.redacted(),
            ..self.clone()
        }
    }
}

/// Builds an [`AutoAnkiConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace
    pub fn load(workspace_root: &Path) -> Result<AutoAnkiConfig, ApiError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder);
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root);
        let builder = sources::environment::add_to_builder(builder);

        let config = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load a single explicit file; environment overrides still apply
    pub fn load_from_file(path: &Path) -> Result<AutoAnkiConfig, ApiError> {
        if !path.is_file() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge::builder_with_defaults()?
            .add_source(config::File::from(path).required(true));
        let builder = sources::environment::add_to_builder(builder);

        let config = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}
