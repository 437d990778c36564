//! Configuration for fishutils event buses and logging.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fishutils_config::Config;
//!
//! // Defaults, then the file, then FISHUTILS_* env vars as fallback.
//! let resolved = Config::load(Some(std::path::Path::new("fishutils.toml"))).unwrap();
//! println!("error policy: {}", resolved.config.bus.error_policy);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Config file** passed to [`Config::load`]
//! 2. **Environment variables** (`FISHUTILS_*`), used only for fields the file leaves unset
//! 3. **Embedded defaults** (`defaults.toml` compiled into binary)
//!
//! # Design
//!
//! This crate has **no dependencies on other internal fishutils crates**.
//! Conversion into bus and logging types happens in the `config` features of
//! `fishutils-events` and `fishutils-telemetry`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Layered configuration merging with source tracking.
pub mod merge;
/// Common imports.
pub mod prelude;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use merge::ConfigLayer;
pub use types::*;

impl Config {
    /// Load configuration from defaults, `path` and the process environment.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is malformed or the final
    /// configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(path, &env::collect_env_vars())
    }

    /// Load configuration with an explicit set of environment variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is malformed or the final
    /// configuration fails validation.
    pub fn load_with_env<S: std::hash::BuildHasher>(
        path: Option<&std::path::Path>,
        env_vars: &std::collections::HashMap<String, String, S>,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(path, env_vars)
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse configuration from a TOML string (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the string cannot be parsed or fails
    /// validation.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        loader::from_toml_str(content)
    }
}
