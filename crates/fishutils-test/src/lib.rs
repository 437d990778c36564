//! Fishutils Test - Shared test utilities for fishutils.
//!
//! This crate provides fixture events, a recording subscriber and harness
//! helpers that can be used across the workspace as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! fishutils-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fishutils_events::{EventBus, Priority};
//! use fishutils_test::{BaseEvent, DerivedEvent, OrderLog, Recorder};
//!
//! #[test]
//! fn test_derived_reaches_base_handler() {
//!     let log = OrderLog::new();
//!     let bus = EventBus::new();
//!     bus.subscribe(Arc::new(
//!         Recorder::new("r", &log).on::<BaseEvent>("base", Priority::Normal),
//!     ))
//!     .unwrap();
//!
//!     bus.fire(&mut DerivedEvent::new("d")).unwrap();
//!     assert_eq!(log.entries(), vec!["r.base"]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod record;

pub use fixtures::*;
pub use harness::*;
pub use record::*;
