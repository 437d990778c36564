//! Fishutils Telemetry - Logging setup on `tracing`.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats
//! - Stdout, stderr and rolling file targets
//! - With the `config` feature, conversion from the `[logging]` config section
//!
//! Library crates in this workspace only emit `tracing` events; installing a
//! subscriber is left to the application, through this crate or any other.
//!
//! # Example
//!
//! ```rust,no_run
//! use fishutils_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), fishutils_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("fishutils_events=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

#[cfg(feature = "config")]
mod config;
mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
