//! Unified prelude for fishutils.
//!
//! This crate provides a single import to bring in all commonly used types
//! from across fishutils, with the config bridges of every crate enabled.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fishutils_prelude::*;
//!
//! // Now you have access to types from:
//! // - fishutils-events (buses, events, subscribers)
//! // - fishutils-config (layered configuration)
//! // - fishutils-telemetry (logging setup)
//! ```
//!
//! # Per-Crate Preludes
//!
//! If you only need types from specific crates, use their individual preludes:
//!
//! ```rust,ignore
//! use fishutils_events::prelude::*;
//! use fishutils_config::prelude::*;
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fishutils_prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Started {
//!     signatures: Signatures,
//! }
//! impl_event!(Started);
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?.config;
//! setup_logging(&LogConfig::from_config(&config.logging)?)?;
//!
//! let bus = EventBus::from_config(&config.bus);
//! bus.subscribe(Arc::new(Listener::new("boot").on(|_: &Started| {
//!     println!("started");
//! })))?;
//! bus.fire(&mut Started::default())?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

// Re-export all crate preludes
pub use fishutils_config::prelude::*;
pub use fishutils_events::prelude::*;
pub use fishutils_telemetry::prelude::*;
