//! Merge rules: defaults, override order, conflict handling.
//!
//! Sources are layered lowest to highest precedence; later sources replace
//! individual keys, not whole tables.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub const DEFAULT_MODEL: &str = "deepseek-r1:8b";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("backend.kind", "ollama")?
        .set_default("backend.request_timeout_secs", 120)?
        .set_default("default_model", DEFAULT_MODEL)
}
