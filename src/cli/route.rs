//! CLI route: single route table and run context. Dispatches to the workflow
//! and presentation.

use crate::assembler::{ResultAssembler, WorkflowResponse};
use crate::cli::command_name;
use crate::cli::output::CommandOutput;
use crate::cli::parse::{Commands, ConfigCommands};
use crate::cli::presentation::{
    format_config_validation, format_generate_json, format_generate_text, format_health_text,
    format_models_json, format_models_text, HealthReport,
};
use crate::config::{AutoAnkiConfig, ConfigLoader};
use crate::error::{ApiError, ProviderErrorKind};
use crate::provider::{BackendKind, ProviderFactory, TextGenerator};
use crate::workflow::Orchestrator;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace and effective configuration.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    config: AutoAnkiConfig,
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self::with_config(config, workspace_root, config_path))
    }

    /// Context around an already loaded configuration
    pub fn with_config(
        config: AutoAnkiConfig,
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            workspace_root,
            config_path,
        }
    }

    pub fn config(&self) -> &AutoAnkiConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(
            command = %name,
            workspace = %self.workspace_root.display(),
            config = ?self.config_path,
            "Executing command"
        );
        let result = self.execute_inner(command).await;
        match &result {
            Ok(output) => info!(
                command = %name,
                success = output.success,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Command finished"
            ),
            Err(e) => warn!(command = %name, error = %e, "Command failed"),
        }
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Generate {
                instructions,
                model,
                format,
                stage_timeout,
            } => {
                self.handle_generate(instructions, model.as_deref(), format, *stage_timeout)
                    .await
            }
            Commands::Models { format } => self.handle_models(format).await,
            Commands::Health => self.handle_health().await,
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    fn generator(&self) -> Result<Arc<dyn TextGenerator>, ApiError> {
        ProviderFactory::create(&self.config.backend, &self.config.retry)
    }

    async fn handle_generate(
        &self,
        instructions: &[String],
        model: Option<&str>,
        format: &str,
        stage_timeout: Option<u64>,
    ) -> Result<CommandOutput, ApiError> {
        if let Some(blank) = instructions.iter().position(|i| i.trim().is_empty()) {
            return Err(ApiError::InvalidRequest(format!(
                "instruction {} is empty",
                blank + 1
            )));
        }
        self.config.ensure_valid()?;

        let mut settings = self.config.workflow.clone();
        if stage_timeout.is_some() {
            settings.stage_timeout_secs = stage_timeout;
        }
        let orchestrator = Orchestrator::new(self.generator()?, &settings)
            .with_generation_options(self.config.generation.clone());
        let model = model.unwrap_or(&self.config.default_model);

        // Independent runs; each owns its state
        let states = join_all(
            instructions
                .iter()
                .map(|instruction| orchestrator.run(instruction, model)),
        )
        .await;

        let assembler = ResultAssembler::new(settings.cards.clone());
        let responses: Vec<WorkflowResponse> = states
            .into_iter()
            .map(|state| assembler.assemble(state))
            .collect();
        let success = responses.iter().all(WorkflowResponse::is_success);

        let body = if format == "json" {
            format_generate_json(&responses)?
        } else {
            format_generate_text(&responses)
        };
        Ok(CommandOutput { body, success })
    }

    async fn handle_models(&self, format: &str) -> Result<CommandOutput, ApiError> {
        let generator = self.generator()?;
        let models = generator.list_models().await?;
        let backend = self.config.backend.kind.as_str();
        let body = if format == "json" {
            format_models_json(backend, &models)
        } else {
            format_models_text(backend, &models)
        };
        Ok(CommandOutput::ok(body))
    }

    async fn handle_health(&self) -> Result<CommandOutput, ApiError> {
        let generator = self.generator()?;
        let backend = self.config.backend.kind;
        let endpoint = self
            .config
            .backend
            .endpoint
            .clone()
            .unwrap_or_else(|| "(default endpoint)".to_string());

        let (healthy, detail) = match generator.list_models().await {
            Ok(models) => (true, format!("{} model(s) available", models.len())),
            // The Inference API exposes no listing; a configured key is all we can check
            Err(e) if backend == BackendKind::HuggingFace && e.kind == ProviderErrorKind::NotFound => {
                (true, "Reachability not checked: backend has no model listing".to_string())
            }
            Err(e) => (false, e.to_string()),
        };

        let report = HealthReport {
            backend: backend.as_str().to_string(),
            endpoint,
            healthy,
            detail,
        };
        let body = format_health_text(&report);
        Ok(if healthy {
            CommandOutput::ok(body)
        } else {
            CommandOutput::failed(body)
        })
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<CommandOutput, ApiError> {
        match command {
            ConfigCommands::Show => {
                let body = toml::to_string_pretty(&self.config.redacted())
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                Ok(CommandOutput::ok(body))
            }
            ConfigCommands::Validate => {
                let result = self.config.validate();
                let body = format_config_validation(&result);
                Ok(if result.is_ok() {
                    CommandOutput::ok(body)
                } else {
                    CommandOutput::failed(body)
                })
            }
        }
    }
}
