//! Fishutils Events - Typed synchronous event bus.
//!
//! This crate provides:
//! - Event types described by static [`Kind`] tags with a parent chain
//! - Subscription tables that bind handlers to subscriber instances
//! - An [`EventBus`] that forwards everything it receives to dependent buses
//! - A [`CancellableEventBus`] whose handlers can halt further propagation
//!
//! # Architecture
//!
//! Subscribers declare their handlers through a [`Subscriptions`] table. The
//! table is validated when the subscriber is added to a bus; an invalid table
//! rejects the whole subscriber. Firing an event walks the bus's subscribers
//! in registration order, runs each subscriber's handlers from the highest
//! [`Priority`] down, and then fires the same event instance on every bus
//! hooked to it.
//!
//! Unless a bus is created with duplicate processing enabled, it signs every
//! event it fires and ignores events that already carry its signature, so one
//! event reaching the same bus through several forwarding paths is delivered
//! there once.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fishutils_events::{EventBus, Listener, Signatures, impl_event};
//!
//! #[derive(Debug, Default)]
//! struct Ping {
//!     signatures: Signatures,
//! }
//! impl_event!(Ping);
//!
//! let parent = EventBus::new();
//! let child = EventBus::new();
//! child.hook(&parent).unwrap();
//!
//! child
//!     .subscribe(Arc::new(Listener::new("printer").on(|_: &Ping| println!("pong"))))
//!     .unwrap();
//!
//! parent.fire(&mut Ping::default()).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod cancellable;
#[cfg(feature = "config")]
mod config;
mod cow;
mod error;
mod event;
mod identity;
mod resolve;
mod subscriber;

pub use bus::{EventBus, EventBusBuilder};
pub use cancellable::CancellableEventBus;
pub use error::{
    ErrorAction, ErrorHandler, EventBusError, EventBusResult, HandlerFailure,
    HandlerInvocationError,
};
pub use event::{Event, EventType, GenericEvent, Kind, Signatures};
pub use identity::BusId;
pub use subscriber::{
    Handler, HandlerReturn, Listener, Priority, Propagation, Subscriber, Subscriptions,
};
