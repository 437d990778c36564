//! Event bus: subscribers, forwarding edges and dispatch.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock, Mutex, PoisonError, RwLock};

use tracing::{debug, trace};

use crate::cancellable::CancellableEventBus;
use crate::cow::CowList;
use crate::error::{ErrorAction, ErrorHandler, EventBusError, EventBusResult, HandlerInvocationError};
use crate::event::Event;
use crate::identity::BusId;
use crate::resolve::Registration;
use crate::subscriber::{Propagation, Subscriber};

/// Shared instance returned by [`EventBus::global`].
static GLOBAL: LazyLock<EventBus> = LazyLock::new(EventBus::new);

/// Serializes forwarding-graph edits so the cycle check and the insertion
/// see the same graph.
static TOPOLOGY: Mutex<()> = Mutex::new(());

/// How a bus treats handler return values during one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// Return values never stop delivery.
    Plain,
    /// A [`Propagation::Cancel`] stops the whole call tree.
    Cancellable,
}

struct BusCore {
    id: BusId,
    name: Option<String>,
    process_duplicates: bool,
    cancellable: bool,
    subscribers: CowList<Arc<Registration>>,
    /// Buses that receive everything this bus fires.
    dependents: CowList<EventBus>,
    error_handler: RwLock<ErrorHandler>,
}

impl Drop for BusCore {
    fn drop(&mut self) {
        self.id.release();
    }
}

/// A synchronous publish/subscribe domain.
///
/// `EventBus` is a handle: clones share the same identity, subscribers,
/// forwarding edges and error handler. Two handles compare equal when they
/// refer to the same bus.
///
/// Firing runs entirely on the caller's thread. Subscribers are visited in
/// registration order and each subscriber's handlers from the highest
/// [`Priority`](crate::Priority) down; afterwards the same event instance is
/// fired on every bus hooked to this one.
///
/// A bus holds strong handles to the buses hooked to it. Hooking a bus from
/// inside one of its own subscribers' state keeps both alive until unhooked.
#[derive(Clone)]
pub struct EventBus {
    core: Arc<BusCore>,
}

impl EventBus {
    /// Create a bus that processes each event instance at most once.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a bus that processes an event every time it arrives, even when
    /// it arrives again through another forwarding path.
    #[must_use]
    pub fn with_duplicates() -> Self {
        Self::builder().with_duplicates(true).build()
    }

    /// Start configuring a bus.
    #[must_use]
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::default()
    }

    /// The process-wide shared bus.
    #[must_use]
    pub fn global() -> &'static EventBus {
        &GLOBAL
    }

    /// The bus identifier, also used as its event signature.
    #[must_use]
    pub fn id(&self) -> BusId {
        self.core.id
    }

    /// The name given at construction, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.core.name.as_deref()
    }

    /// Whether this bus skips duplicate suppression.
    #[must_use]
    pub fn processes_duplicates(&self) -> bool {
        self.core.process_duplicates
    }

    /// Whether handler cancellations are honored when this bus is reached
    /// through a cancellable dispatch.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        self.core.cancellable
    }

    /// Number of registered subscribers, counting repeats.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.core.subscribers.len()
    }

    /// Register a subscriber.
    ///
    /// The subscriber's handler table is validated as a whole. A subscriber
    /// may be registered several times; it then receives each event once per
    /// registration.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::InvalidSubscriber`] if any declared handler
    /// has the wrong shape. Nothing is registered in that case.
    pub fn subscribe<S: Subscriber>(&self, subscriber: Arc<S>) -> EventBusResult<()> {
        let registration = Registration::bind(subscriber)?;
        debug!(
            bus = %self.core.id,
            subscriber = %registration.name,
            handlers = registration.handlers.len(),
            "Subscriber registered"
        );
        self.core.subscribers.push(Arc::new(registration));
        Ok(())
    }

    /// Remove one registration of `subscriber`, matched by pointer identity.
    ///
    /// Returns `false` if it was not registered.
    pub fn unsubscribe<S: Subscriber>(&self, subscriber: &Arc<S>) -> bool {
        let removed = self
            .core
            .subscribers
            .remove_first(|registration| registration.is(subscriber));
        if let Some(registration) = &removed {
            debug!(
                bus = %self.core.id,
                subscriber = %registration.name,
                "Subscriber removed"
            );
        }
        removed.is_some()
    }

    /// Remove every subscriber. Forwarding edges are kept.
    pub fn clear(&self) {
        let removed = self.core.subscribers.take();
        debug!(bus = %self.core.id, removed = removed.len(), "Subscribers cleared");
    }

    /// Replace the policy applied to handler failures.
    pub fn set_error_handler(&self, handler: ErrorHandler) {
        debug!(bus = %self.core.id, policy = ?handler, "Error handler replaced");
        *self
            .core
            .error_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = handler;
    }

    /// The current failure policy.
    #[must_use]
    pub fn error_handler(&self) -> ErrorHandler {
        self.core
            .error_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receive every event fired on `parent` from now on.
    ///
    /// Hooking to a parent that already forwards to this bus is a no-op.
    ///
    /// # Errors
    ///
    /// - [`EventBusError::SelfInheritance`] if `parent` is this bus.
    /// - [`EventBusError::RecursiveInheritance`] if `parent` already receives
    ///   events from this bus, directly or transitively. The graph is left
    ///   unchanged.
    pub fn hook(&self, parent: &EventBus) -> EventBusResult<()> {
        if self == parent {
            return Err(EventBusError::SelfInheritance { bus: self.id() });
        }

        let _topology = TOPOLOGY.lock().unwrap_or_else(PoisonError::into_inner);
        if self.forwards_to(parent) {
            return Err(EventBusError::RecursiveInheritance {
                child: self.id(),
                parent: parent.id(),
            });
        }

        if parent
            .core
            .dependents
            .push_unique(self.clone(), |bus| bus == self)
        {
            debug!(child = %self.id(), parent = %parent.id(), "Bus hooked");
        }
        Ok(())
    }

    /// Stop receiving events from `parent`.
    ///
    /// Returns `false` if this bus was not hooked to it.
    pub fn unhook(&self, parent: &EventBus) -> bool {
        let _topology = TOPOLOGY.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = parent.core.dependents.remove_first(|bus| bus == self);
        if removed.is_some() {
            debug!(child = %self.id(), parent = %parent.id(), "Bus unhooked");
        }
        removed.is_some()
    }

    /// Whether this bus receives events from `parent` through a direct edge.
    #[must_use]
    pub fn is_hooked_to(&self, parent: &EventBus) -> bool {
        parent.core.dependents.snapshot().contains(self)
    }

    /// Buses directly hooked to this one, in hook order.
    #[must_use]
    pub fn dependents(&self) -> Vec<EventBus> {
        self.core.dependents.snapshot().to_vec()
    }

    /// Whether `target` is reachable from this bus by following forwarding
    /// edges.
    fn forwards_to(&self, target: &EventBus) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![self.clone()];
        while let Some(bus) = pending.pop() {
            for dependent in bus.core.dependents.snapshot().iter() {
                if dependent == target {
                    return true;
                }
                if visited.insert(dependent.id()) {
                    pending.push(dependent.clone());
                }
            }
        }
        false
    }

    /// Deliver `event` to this bus's subscribers and then to every bus hooked
    /// to it.
    ///
    /// Handler return values are ignored here; use
    /// [`CancellableEventBus::fire_cancellable`] to let handlers stop
    /// delivery.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::HandlerInvocation`] when a handler fails and
    /// the error handler of the bus it ran on chose
    /// [`ErrorAction::Abort`]. Nothing further is delivered in that case.
    pub fn fire(&self, event: &mut dyn Event) -> EventBusResult<()> {
        self.dispatch(event, Delivery::Plain).map(|_| ())
    }

    /// Returns `true` if a handler cancelled the event.
    pub(crate) fn dispatch(
        &self,
        event: &mut dyn Event,
        delivery: Delivery,
    ) -> EventBusResult<bool> {
        let id = self.core.id;
        let kind = event.kind();

        if !self.core.process_duplicates && !event.signatures_mut().sign(id) {
            trace!(bus = %id, event = kind.name(), "Duplicate event skipped");
            return Ok(false);
        }

        trace!(bus = %id, event = kind.name(), ?delivery, "Dispatching event");

        let subscribers = self.core.subscribers.snapshot();
        let dependents = self.core.dependents.snapshot();
        for registration in subscribers.iter() {
            for handler in registration.handlers.iter().filter(|h| h.matches(&kind)) {
                match handler.invoke(&*event) {
                    Ok(Propagation::Cancel) if delivery == Delivery::Cancellable => {
                        trace!(
                            bus = %id,
                            event = kind.name(),
                            subscriber = %registration.name,
                            handler = %handler.label,
                            "Event cancelled"
                        );
                        return Ok(true);
                    },
                    Ok(_) => {},
                    Err(failure) => {
                        let error = HandlerInvocationError {
                            bus: id,
                            subscriber: registration.name.clone(),
                            handler: handler.label.clone(),
                            event: kind.name(),
                            failure,
                        };
                        if self.error_handler().handle(&error) == ErrorAction::Abort {
                            return Err(error.into());
                        }
                    },
                }
            }
        }

        for dependent in dependents.iter() {
            let mode = if delivery == Delivery::Cancellable && dependent.is_cancellable() {
                Delivery::Cancellable
            } else {
                Delivery::Plain
            };
            if dependent.dispatch(event, mode)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for EventBus {
    fn eq(&self, other: &Self) -> bool {
        self.core.id == other.core.id
    }
}

impl Eq for EventBus {}

impl Hash for EventBus {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.core.id.hash(state);
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("id", &self.core.id)
            .field("name", &self.core.name)
            .field("process_duplicates", &self.core.process_duplicates)
            .field("cancellable", &self.core.cancellable)
            .field("subscribers", &self.core.subscribers.len())
            .field("dependents", &self.core.dependents.len())
            .finish()
    }
}

/// Builder for [`EventBus`] and [`CancellableEventBus`].
#[derive(Debug, Default)]
pub struct EventBusBuilder {
    name: Option<String>,
    process_duplicates: bool,
    error_handler: ErrorHandler,
}

impl EventBusBuilder {
    /// Name the bus in logs.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Process events that already passed through this bus.
    #[must_use]
    pub fn with_duplicates(mut self, process_duplicates: bool) -> Self {
        self.process_duplicates = process_duplicates;
        self
    }

    /// Set the handler failure policy.
    #[must_use]
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = handler;
        self
    }

    /// Build a plain bus.
    #[must_use]
    pub fn build(self) -> EventBus {
        self.finish(false)
    }

    /// Build a bus whose handlers can cancel delivery.
    #[must_use]
    pub fn build_cancellable(self) -> CancellableEventBus {
        CancellableEventBus::from_bus(self.finish(true))
    }

    fn finish(self, cancellable: bool) -> EventBus {
        let core = BusCore {
            id: BusId::allocate(),
            name: self.name,
            process_duplicates: self.process_duplicates,
            cancellable,
            subscribers: CowList::new(),
            dependents: CowList::new(),
            error_handler: RwLock::new(self.error_handler),
        };
        debug!(
            bus = %core.id,
            name = core.name.as_deref(),
            process_duplicates = core.process_duplicates,
            cancellable,
            "Event bus created"
        );
        EventBus {
            core: Arc::new(core),
        }
    }
}
