//! Bus variant whose handlers can stop delivery.

use std::ops::Deref;

use crate::bus::{Delivery, EventBus};
use crate::error::EventBusResult;
use crate::event::Event;

/// An [`EventBus`] that can fire events cancellably.
///
/// A handler cancels by returning `true` or [`Propagation::Cancel`]. Nothing
/// after it runs: not the remaining handlers, not later subscribers, not the
/// remaining forwarding subtree. Dependents that are not cancellable are
/// fired plainly and can never cancel their ancestor's delivery.
///
/// All [`EventBus`] operations are available through `Deref`.
///
/// [`Propagation::Cancel`]: crate::Propagation::Cancel
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CancellableEventBus {
    bus: EventBus,
}

impl CancellableEventBus {
    /// Create a cancellable bus that processes each event at most once.
    #[must_use]
    pub fn new() -> Self {
        EventBus::builder().build_cancellable()
    }

    /// Create a cancellable bus that processes repeated arrivals.
    #[must_use]
    pub fn with_duplicates() -> Self {
        EventBus::builder().with_duplicates(true).build_cancellable()
    }

    pub(crate) fn from_bus(bus: EventBus) -> Self {
        Self { bus }
    }

    /// Fire `event`, stopping at the first handler that cancels it.
    ///
    /// Returns `true` if the event was cancelled. An event this bus already
    /// processed is skipped and reported as not cancelled.
    ///
    /// # Errors
    ///
    /// Same as [`EventBus::fire`].
    pub fn fire_cancellable(&self, event: &mut dyn Event) -> EventBusResult<bool> {
        self.bus.dispatch(event, Delivery::Cancellable)
    }

    /// The underlying bus handle.
    #[must_use]
    pub fn as_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Give up the cancellable view, keeping the bus.
    #[must_use]
    pub fn into_bus(self) -> EventBus {
        self.bus
    }
}

impl Default for CancellableEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for CancellableEventBus {
    type Target = EventBus;

    fn deref(&self) -> &EventBus {
        &self.bus
    }
}

impl AsRef<EventBus> for CancellableEventBus {
    fn as_ref(&self) -> &EventBus {
        &self.bus
    }
}

impl From<CancellableEventBus> for EventBus {
    fn from(bus: CancellableEventBus) -> Self {
        bus.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Signatures;
    use crate::subscriber::{Handler, Listener, Priority, Propagation};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Ping {
        signatures: Signatures,
    }
    crate::impl_event!(Ping);

    fn counting(name: &str, count: &Arc<AtomicUsize>) -> Arc<Listener> {
        let count = Arc::clone(count);
        Arc::new(Listener::new(name).on(move |_: &Ping| {
            count.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_cancel_stops_later_handlers() {
        let bus = CancellableEventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        bus.subscribe(Arc::new(
            Listener::new("gate")
                .with(Handler::unbound(move |_: &Ping| {
                    seen.fetch_add(1, Ordering::SeqCst);
                }))
                .with(Handler::unbound(|_: &Ping| Propagation::Cancel).with_priority(Priority::High)),
        ))
        .unwrap();
        bus.subscribe(counting("later", &count)).unwrap();

        assert!(bus.fire_cancellable(&mut Ping::default()).unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_false_does_not_cancel() {
        let bus = CancellableEventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Arc::new(Listener::new("no").on(|_: &Ping| false)))
            .unwrap();
        bus.subscribe(counting("after", &count)).unwrap();

        assert!(!bus.fire_cancellable(&mut Ping::default()).unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_reported_not_cancelled() {
        let bus = CancellableEventBus::new();
        bus.subscribe(Arc::new(Listener::new("yes").on(|_: &Ping| true)))
            .unwrap();
        let mut ping = Ping::default();

        assert!(bus.fire_cancellable(&mut ping).unwrap());
        assert!(!bus.fire_cancellable(&mut ping).unwrap());
    }

    #[test]
    fn test_handle_conversions() {
        let bus = CancellableEventBus::with_duplicates();
        assert!(bus.is_cancellable());
        assert!(bus.processes_duplicates());

        let id = bus.id();
        assert_eq!(bus.as_bus().id(), id);
        let plain: EventBus = bus.clone().into();
        assert_eq!(plain.id(), id);
        assert!(plain.is_cancellable());
        assert_eq!(bus.into_bus(), plain);
    }
}
