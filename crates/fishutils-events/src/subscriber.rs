//! Subscriber trait and handler declarations.
//!
//! A subscriber describes its handlers in a [`Subscriptions`] table instead of
//! relying on runtime introspection. Each [`Handler`] declares the parameter
//! list it accepts, optional `value`/`only` filters and a [`Priority`].

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::error::HandlerFailure;
use crate::event::{Event, EventType, Kind};

/// Delivery order of a handler within its subscriber. Higher runs first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Runs before everything else.
    Highest,
    /// Runs before normal handlers.
    High,
    /// The neutral default.
    #[default]
    Normal,
    /// Runs after normal handlers.
    Low,
    /// Runs after everything else.
    Lowest,
}

/// Whether delivery of an event should go on after a handler returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Propagation {
    /// Keep delivering.
    #[default]
    Continue,
    /// Stop delivering. Only honored by cancellable dispatch.
    Cancel,
}

/// Values a handler may return.
///
/// `()` and `false` continue, `true` cancels, and an `Err` is reported to the
/// bus's error handler.
pub trait HandlerReturn {
    /// Convert into a propagation decision or a failure.
    ///
    /// # Errors
    ///
    /// Returns the handler's own error as a [`HandlerFailure`].
    fn into_propagation(self) -> Result<Propagation, HandlerFailure>;
}

impl HandlerReturn for () {
    fn into_propagation(self) -> Result<Propagation, HandlerFailure> {
        Ok(Propagation::Continue)
    }
}

impl HandlerReturn for bool {
    fn into_propagation(self) -> Result<Propagation, HandlerFailure> {
        Ok(if self {
            Propagation::Cancel
        } else {
            Propagation::Continue
        })
    }
}

impl HandlerReturn for Propagation {
    fn into_propagation(self) -> Result<Propagation, HandlerFailure> {
        Ok(self)
    }
}

impl<T, E> HandlerReturn for Result<T, E>
where
    T: HandlerReturn,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    fn into_propagation(self) -> Result<Propagation, HandlerFailure> {
        match self {
            Ok(value) => value.into_propagation(),
            Err(error) => Err(HandlerFailure::Error(error.into())),
        }
    }
}

pub(crate) type HandlerFn<S> =
    Arc<dyn Fn(&S, &dyn Event) -> Result<Propagation, HandlerFailure> + Send + Sync>;

/// One declared handler of a subscriber of type `S`.
pub struct Handler<S> {
    pub(crate) label: Option<String>,
    pub(crate) params: Vec<Kind>,
    pub(crate) value: Vec<Kind>,
    pub(crate) only: Vec<Kind>,
    pub(crate) priority: Priority,
    pub(crate) call: HandlerFn<S>,
}

impl<S: 'static> Handler<S> {
    /// A handler taking one event of type `E`.
    ///
    /// Events of `E` and of every kind derived from `E` are delivered, subject
    /// to the filters added with [`Handler::with_value`] and
    /// [`Handler::with_only`].
    pub fn new<E, F, R>(handler: F) -> Self
    where
        E: EventType,
        F: Fn(&S, &E) -> R + Send + Sync + 'static,
        R: HandlerReturn + 'static,
    {
        let call = move |subscriber: &S, event: &dyn Event| match event.downcast_ref::<E>() {
            Some(event) => handler(subscriber, event).into_propagation(),
            None => Err(HandlerFailure::ViewUnavailable {
                expected: E::event_kind().name(),
            }),
        };
        Self::from_parts(vec![E::event_kind()], Arc::new(call))
    }

    /// A handler that does not need the subscriber instance.
    pub fn unbound<E, F, R>(handler: F) -> Self
    where
        E: EventType,
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: HandlerReturn + 'static,
    {
        Self::new(move |_: &S, event: &E| handler(event))
    }

    /// A handler with an explicitly declared parameter list, receiving the
    /// event untyped.
    ///
    /// The declaration is checked when the subscriber is added to a bus: it
    /// must name exactly one event kind.
    pub fn raw<F, R>(params: Vec<Kind>, handler: F) -> Self
    where
        F: Fn(&S, &dyn Event) -> R + Send + Sync + 'static,
        R: HandlerReturn + 'static,
    {
        let call = move |subscriber: &S, event: &dyn Event| {
            handler(subscriber, event).into_propagation()
        };
        Self::from_parts(params, Arc::new(call))
    }

    fn from_parts(params: Vec<Kind>, call: HandlerFn<S>) -> Self {
        Self {
            label: None,
            params,
            value: Vec::new(),
            only: Vec::new(),
            priority: Priority::default(),
            call,
        }
    }

    /// Accept `E` and kinds derived from it.
    #[must_use]
    pub fn with_value<E: EventType>(self) -> Self {
        self.with_value_kind(E::event_kind())
    }

    /// Accept exactly `E`, not kinds derived from it.
    #[must_use]
    pub fn with_only<E: EventType>(self) -> Self {
        self.with_only_kind(E::event_kind())
    }

    /// Add a kind to the `value` filter.
    #[must_use]
    pub fn with_value_kind(mut self, kind: Kind) -> Self {
        self.value.push(kind);
        self
    }

    /// Add a kind to the `only` filter.
    #[must_use]
    pub fn with_only_kind(mut self, kind: Kind) -> Self {
        self.only.push(kind);
        self
    }

    /// Set the delivery priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Name the handler in errors and logs.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl<S> Handler<S> {
    /// Declared parameter kinds.
    #[must_use]
    pub fn params(&self) -> &[Kind] {
        &self.params
    }

    /// The `value` filter.
    #[must_use]
    pub fn value(&self) -> &[Kind] {
        &self.value
    }

    /// The `only` filter.
    #[must_use]
    pub fn only(&self) -> &[Kind] {
        &self.only
    }

    /// Delivery priority.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Handler label, if set.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl<S> Clone for Handler<S> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            params: self.params.clone(),
            value: self.value.clone(),
            only: self.only.clone(),
            priority: self.priority,
            call: Arc::clone(&self.call),
        }
    }
}

impl<S> fmt::Debug for Handler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("label", &self.label)
            .field("params", &self.params)
            .field("value", &self.value)
            .field("only", &self.only)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// The handler table of one subscriber.
pub struct Subscriptions<S> {
    handlers: Vec<Handler<S>>,
}

impl<S: 'static> Subscriptions<S> {
    /// An empty table. Subscribers with no handlers are accepted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Add a handler for `E` with default settings.
    #[must_use]
    pub fn on<E, F, R>(self, handler: F) -> Self
    where
        E: EventType,
        F: Fn(&S, &E) -> R + Send + Sync + 'static,
        R: HandlerReturn + 'static,
    {
        self.with(Handler::new(handler))
    }

    /// Add a fully configured handler.
    #[must_use]
    pub fn with(mut self, handler: Handler<S>) -> Self {
        self.handlers.push(handler);
        self
    }
}

impl<S> Subscriptions<S> {
    /// The declared handlers, in declaration order.
    #[must_use]
    pub fn handlers(&self) -> &[Handler<S>] {
        &self.handlers
    }

    /// Number of declared handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn into_handlers(self) -> Vec<Handler<S>> {
        self.handlers
    }
}

impl<S: 'static> Default for Subscriptions<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for Subscriptions<S> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<S> fmt::Debug for Subscriptions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.handlers).finish()
    }
}

/// An object that receives events through the handlers it declares.
///
/// The bus holds the subscriber through the `Arc` it was given until it is
/// unsubscribed. A subscriber that owns a handle to the same bus keeps both
/// alive; hold a [`std::sync::Weak`] or a separate channel instead.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use fishutils_events::{Handler, Priority, Signatures, Subscriber, Subscriptions, impl_event};
///
/// #[derive(Debug, Default)]
/// struct Tick {
///     signatures: Signatures,
/// }
/// impl_event!(Tick);
///
/// #[derive(Default)]
/// struct Counter {
///     ticks: AtomicUsize,
/// }
///
/// impl Counter {
///     fn on_tick(&self, _tick: &Tick) {
///         self.ticks.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// impl Subscriber for Counter {
///     fn subscriptions(&self) -> Subscriptions<Self> {
///         Subscriptions::new().with(Handler::new(Self::on_tick).with_priority(Priority::High))
///     }
/// }
/// ```
pub trait Subscriber: Send + Sync + Sized + 'static {
    /// Declare the handlers of this subscriber.
    fn subscriptions(&self) -> Subscriptions<Self>;

    /// Name used in errors and logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A named subscriber made only of closures.
pub struct Listener {
    name: String,
    table: Subscriptions<Listener>,
}

impl Listener {
    /// Create a listener with no handlers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: Subscriptions::new(),
        }
    }

    /// Add a closure handling `E`.
    #[must_use]
    pub fn on<E, F, R>(self, handler: F) -> Self
    where
        E: EventType,
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: HandlerReturn + 'static,
    {
        self.with(Handler::unbound(handler))
    }

    /// Add a fully configured handler.
    #[must_use]
    pub fn with(mut self, handler: Handler<Listener>) -> Self {
        self.table = self.table.with(handler);
        self
    }
}

impl Subscriber for Listener {
    fn subscriptions(&self) -> Subscriptions<Self> {
        self.table.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("handlers", &self.table.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Signatures;

    #[derive(Debug, Default)]
    struct Ping {
        signatures: Signatures,
    }
    crate::impl_event!(Ping);

    #[derive(Debug, Default)]
    struct Pong {
        signatures: Signatures,
    }
    crate::impl_event!(Pong);

    #[test]
    fn test_priority_order() {
        let mut priorities = vec![
            Priority::Low,
            Priority::Highest,
            Priority::Normal,
            Priority::Lowest,
            Priority::High,
        ];
        priorities.sort();
        assert_eq!(
            priorities,
            vec![
                Priority::Highest,
                Priority::High,
                Priority::Normal,
                Priority::Low,
                Priority::Lowest,
            ]
        );
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_handler_returns() {
        assert_eq!(().into_propagation().unwrap(), Propagation::Continue);
        assert_eq!(true.into_propagation().unwrap(), Propagation::Cancel);
        assert_eq!(false.into_propagation().unwrap(), Propagation::Continue);

        let ok: Result<bool, String> = Ok(true);
        assert_eq!(ok.into_propagation().unwrap(), Propagation::Cancel);

        let err: Result<(), String> = Err("nope".to_string());
        assert!(matches!(
            err.into_propagation(),
            Err(HandlerFailure::Error(e)) if e.to_string() == "nope"
        ));
    }

    #[test]
    fn test_handler_builder() {
        let handler: Handler<()> = Handler::unbound(|_: &Ping| {})
            .with_only::<Ping>()
            .with_value_kind(Kind::event::<Pong>())
            .with_priority(Priority::Low)
            .with_label("ping");

        assert_eq!(handler.params(), &[Kind::event::<Ping>()]);
        assert_eq!(handler.only(), &[Kind::event::<Ping>()]);
        assert_eq!(handler.value(), &[Kind::event::<Pong>()]);
        assert_eq!(handler.priority(), Priority::Low);
        assert_eq!(handler.label(), Some("ping"));
    }

    #[test]
    fn test_typed_handler_rejects_foreign_event() {
        let handler: Handler<()> = Handler::unbound(|_: &Ping| {});
        let pong = Pong::default();
        let event: &dyn Event = &pong;
        assert!(matches!(
            (handler.call)(&(), event),
            Err(HandlerFailure::ViewUnavailable { expected: "Ping" })
        ));
    }

    #[test]
    fn test_listener_table() {
        let listener = Listener::new("both")
            .on(|_: &Ping| {})
            .with(Handler::unbound(|_: &Pong| true).with_priority(Priority::High));

        assert_eq!(listener.name(), "both");
        let table = listener.subscriptions();
        assert_eq!(table.len(), 2);
        assert_eq!(table.handlers()[1].priority(), Priority::High);
    }

    #[test]
    fn test_default_subscriber_name() {
        struct Quiet;
        impl Subscriber for Quiet {
            fn subscriptions(&self) -> Subscriptions<Self> {
                Subscriptions::new()
            }
        }
        assert!(Quiet.name().ends_with("Quiet"));
        assert!(Quiet.subscriptions().is_empty());
    }
}
