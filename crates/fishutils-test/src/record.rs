//! Ordered delivery recording.

use std::sync::{Arc, Mutex, PoisonError};

use fishutils_events::{EventType, Handler, Priority, Subscriber, Subscriptions};

/// A shared, ordered log of deliveries.
///
/// Clones append to the same log.
#[derive(Debug, Clone, Default)]
pub struct OrderLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl OrderLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// A copy of the entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times `entry` was recorded.
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| *e == entry)
            .count()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// A subscriber whose handlers write `"{name}.{label}"` to an [`OrderLog`].
///
/// ```rust
/// use std::sync::Arc;
/// use fishutils_events::{EventBus, Priority};
/// use fishutils_test::{BaseEvent, OrderLog, Recorder};
///
/// let log = OrderLog::new();
/// let bus = EventBus::new();
/// bus.subscribe(Arc::new(
///     Recorder::new("r", &log)
///         .on::<BaseEvent>("low", Priority::Low)
///         .on::<BaseEvent>("high", Priority::High),
/// ))
/// .unwrap();
///
/// bus.fire(&mut BaseEvent::new("x")).unwrap();
/// assert_eq!(log.entries(), vec!["r.high", "r.low"]);
/// ```
#[derive(Debug)]
pub struct Recorder {
    name: String,
    log: OrderLog,
    table: Subscriptions<Recorder>,
}

impl Recorder {
    /// A recorder with no handlers, writing to `log`.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &OrderLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            table: Subscriptions::new(),
        }
    }

    /// The log this recorder writes to.
    #[must_use]
    pub fn log(&self) -> &OrderLog {
        &self.log
    }

    fn entry(&self, label: &str) -> String {
        format!("{}.{label}", self.name)
    }

    /// Record deliveries of `E`.
    #[must_use]
    pub fn on<E: EventType>(self, label: &str, priority: Priority) -> Self {
        self.on_with::<E>(label, |handler| handler.with_priority(priority))
    }

    /// Record deliveries of `E` through a handler adjusted by `configure`,
    /// e.g. to add `value`/`only` filters.
    #[must_use]
    pub fn on_with<E: EventType>(
        mut self,
        label: &str,
        configure: impl FnOnce(Handler<Recorder>) -> Handler<Recorder>,
    ) -> Self {
        let owned = label.to_owned();
        let handler = Handler::new(move |recorder: &Recorder, _: &E| {
            recorder.log.push(recorder.entry(&owned));
        })
        .with_label(label);
        self.table = self.table.with(configure(handler));
        self
    }

    /// Record deliveries of `E`, then cancel the event.
    #[must_use]
    pub fn cancelling<E: EventType>(mut self, label: &str, priority: Priority) -> Self {
        let owned = label.to_owned();
        let handler = Handler::new(move |recorder: &Recorder, _: &E| {
            recorder.log.push(recorder.entry(&owned));
            true
        })
        .with_label(label)
        .with_priority(priority);
        self.table = self.table.with(handler);
        self
    }

    /// Record deliveries of `E`, then fail with an error.
    #[must_use]
    pub fn failing<E: EventType>(mut self, label: &str, priority: Priority) -> Self {
        let owned = label.to_owned();
        let handler = Handler::new(move |recorder: &Recorder, _: &E| {
            recorder.log.push(recorder.entry(&owned));
            Err::<(), _>(format!("{} failed", recorder.entry(&owned)))
        })
        .with_label(label)
        .with_priority(priority);
        self.table = self.table.with(handler);
        self
    }
}

impl Subscriber for Recorder {
    fn subscriptions(&self) -> Subscriptions<Self> {
        self.table.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
