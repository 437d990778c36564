//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Accepted values of `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Accepted values of `logging.format`.
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_bus(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_bus(config: &Config) -> ConfigResult<()> {
    if config
        .bus
        .name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: "bus.name".to_owned(),
            message: "bus name must not be empty; omit it instead".to_owned(),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let logging = &config.logging;

    if !LOG_LEVELS.contains(&logging.level.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unknown level '{}'; expected one of: {}",
                logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if !LOG_FORMATS.contains(&logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unknown format '{}'; expected one of: {}",
                logging.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }

    if let Some(directive) = logging.directives.iter().find(|d| d.trim().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: "logging.directives".to_owned(),
            message: format!("empty directive '{directive}'"),
        });
    }

    Ok(())
}
