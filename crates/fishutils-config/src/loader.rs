//! Config file loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the config file, if one is given and exists
//! 3. Apply env var fallbacks for fields the file left unset
//! 4. Deserialize the merged tree → `Config`
//! 5. Validate

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::Path;

use tracing::{debug, info};

use crate::env::apply_env_fallbacks;
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// A loaded configuration together with where each field came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Source layer of every leaf field, keyed by dotted path.
    pub field_sources: FieldSources,
    /// Files that contributed to the configuration.
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// The layer that set `field` (e.g. `"logging.level"`).
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<&ConfigLayer> {
        self.field_sources.get(field)
    }
}

/// Load the configuration from defaults, an optional file and env fallbacks.
///
/// A `path` that does not exist is skipped, leaving defaults and env vars.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is unreadable or malformed, or if
/// the merged configuration fails validation.
pub fn load<S: BuildHasher>(
    path: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    // 1. Parse embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    // 2. Config file.
    if let Some(path) = path
        && let Some(overlay) = try_load_file(path)?
    {
        let name = path.display().to_string();
        deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            &ConfigLayer::File(name.clone()),
            &mut field_sources,
        );
        info!(path = %name, "loaded config file");
        loaded_files.push(name);
    }

    // 3. Env var fallbacks.
    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    // 4. Deserialize.
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 5. Validate.
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Parse and validate a configuration from a TOML string (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the string is not valid TOML for [`Config`]
/// or fails validation.
pub fn from_toml_str(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: "<string>".to_owned(),
        source: e,
    })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Load a config from a specific file path (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let content = read_bounded(path)?;
    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match read_bounded(path) {
        Ok(c) => c,
        Err(ConfigError::ReadError { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => return Err(e),
    };

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Read a file, rejecting anything over [`MAX_CONFIG_FILE_SIZE`].
fn read_bounded(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    // Check size after reading to avoid TOCTOU between stat and read.
    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    Ok(content)
}
