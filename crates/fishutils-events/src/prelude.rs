//! Prelude module - commonly used types for convenient import.
//!
//! Use `use fishutils_events::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fishutils_events::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Saved {
//!     signatures: Signatures,
//! }
//! impl_event!(Saved);
//!
//! let bus = CancellableEventBus::new();
//! bus.subscribe(Arc::new(Listener::new("veto").on(|_: &Saved| Propagation::Cancel)))
//!     .unwrap();
//!
//! assert!(bus.fire_cancellable(&mut Saved::default()).unwrap());
//! ```

// Buses
pub use crate::{CancellableEventBus, EventBus, EventBusBuilder};

// Events
pub use crate::{Event, EventType, GenericEvent, Kind, Signatures, impl_event};

// Subscribers
pub use crate::{Handler, Listener, Priority, Propagation, Subscriber, Subscriptions};

// Errors
pub use crate::{ErrorAction, ErrorHandler, EventBusError, EventBusResult};
