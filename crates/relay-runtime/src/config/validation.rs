//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, RelayConfig};

/// Plugin name reserved for the built-in help listing.
pub const RESERVED_PLUGIN: &str = "help";

/// Validates the entire configuration.
pub fn validate_config(config: &RelayConfig) -> ConfigResult<()> {
    validate_names("adapter", &config.adapters)?;
    validate_names("plugin", &config.plugins)?;

    if config.plugins.iter().any(|name| name == RESERVED_PLUGIN) {
        return Err(ConfigError::validation(format!(
            "'{RESERVED_PLUGIN}' is always loaded and must not be listed in plugins"
        )));
    }

    if config.worker.tick_ms == 0 {
        return Err(ConfigError::validation("worker.tick_ms must be greater than 0"));
    }

    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.output is 'file' but logging.file_path is not set",
        ));
    }

    Ok(())
}

fn validate_names(kind: &'static str, names: &[String]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(ConfigError::validation(format!("Empty {kind} name")));
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::duplicate(kind, name));
        }
    }
    Ok(())
}
