//! CLI parse: clap types for AutoAnki. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AutoAnki CLI - flashcard decks from natural-language instructions
#[derive(Parser)]
#[command(name = "autoanki")]
#[command(about = "Generate flashcard decks from natural-language instructions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where config/ is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the research and card generation workflow for each instruction
    Generate {
        /// One or more instructions, e.g. "Generate flashcards about the French Revolution"
        #[arg(required = true)]
        instructions: Vec<String>,
        /// Model to use (defaults to default_model from config)
        #[arg(long)]
        model: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Per-stage timeout in seconds (overrides workflow.stage_timeout_secs)
        #[arg(long)]
        stage_timeout: Option<u64>,
    },
    /// List models offered by the configured backend
    Models {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Check that the configured backend is reachable
    Health,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML (API key redacted)
    Show,
    /// Validate the effective configuration
    Validate,
}
