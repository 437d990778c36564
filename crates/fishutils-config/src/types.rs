//! Configuration struct definitions.
//!
//! Every section uses `#[serde(default)]` so a file only needs to name the
//! fields it changes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for buses built from configuration.
    pub bus: BusConfig,
    /// Logging and tracing settings.
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// BusConfig
// ---------------------------------------------------------------------------

/// Settings for one event bus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Name shown in logs. Must not be empty when set.
    pub name: Option<String>,
    /// Deliver an event again when it reaches the bus through another
    /// forwarding path.
    pub process_duplicates: bool,
    /// Build a bus whose handlers can cancel delivery.
    pub cancellable: bool,
    /// What to do when a handler fails.
    pub error_policy: ErrorPolicy,
}

/// Handler failure policy selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the fire call and report the failure to the caller.
    #[default]
    Abort,
    /// Log the failure and keep delivering.
    Log,
    /// Drop the failure and keep delivering.
    Ignore,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Log => write!(f, "log"),
            Self::Ignore => write!(f, "ignore"),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`, `"off"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["fishutils_events=trace"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}
