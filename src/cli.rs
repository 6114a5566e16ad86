//! CLI domain: parse, route, help, output, and presentation only.
//! No workflow logic; a single route table dispatches to the orchestrator.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::{map_error, CommandOutput};
pub use parse::{Cli, Commands, ConfigCommands};
pub use presentation::{
    format_config_validation, format_generate_json, format_generate_text, format_health_text,
    format_models_json, format_models_text, HealthReport,
};
pub use route::RunContext;
