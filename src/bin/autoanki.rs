//! AutoAnki CLI Binary
//!
//! Command-line interface for the AutoAnki flashcard workflow.

use autoanki::cli::{Cli, RunContext};
use autoanki::config::{AutoAnkiConfig, ConfigLoader};
use autoanki::logging::{init_logging, LoggingConfig};
use clap::Parser;
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let dotenv_path = dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let loaded = load_config(&cli);
    let logging_config = build_logging_config(&cli, loaded.as_ref().ok());

    // Initialize logging early
    if let Err(e) = init_logging(&logging_config) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!(dotenv = ?dotenv_path, "AutoAnki CLI starting");

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", autoanki::cli::map_error(&e));
            process::exit(1);
        }
    };
    let context = RunContext::with_config(config, cli.workspace.clone(), cli.config.clone());

    // Execute command
    match context.execute(&cli.command).await {
        Ok(output) => {
            println!("{}", output.body);
            if !output.success {
                process::exit(2);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", autoanki::cli::map_error(&e));
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<AutoAnkiConfig, autoanki::error::ApiError> {
    match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path),
        None => ConfigLoader::load(&cli.workspace),
    }
}

/// Build logging configuration from CLI args and the config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, config: Option<&AutoAnkiConfig>) -> LoggingConfig {
    let mut logging = config.map(|c| c.logging.clone()).unwrap_or_default();

    if cli.quiet {
        logging.enabled = false;
    }
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        logging.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        logging.file = Some(file.clone());
    }

    logging
}
