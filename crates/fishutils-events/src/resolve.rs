//! Subscriber validation and binding.
//!
//! A subscriber's table is checked as a whole before anything is registered.
//! Accepted handlers are bound to the subscriber instance and sorted by
//! priority once, so dispatch only walks a ready-made list.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{EventBusError, EventBusResult, HandlerFailure};
use crate::event::{Event, Kind};
use crate::subscriber::{Handler, Priority, Propagation, Subscriber};

type BoundFn = Arc<dyn Fn(&dyn Event) -> Result<Propagation, HandlerFailure> + Send + Sync>;

/// A validated handler bound to its subscriber instance.
pub(crate) struct BoundHandler {
    pub(crate) label: String,
    accepts: Kind,
    value: Vec<Kind>,
    only: Vec<Kind>,
    pub(crate) priority: Priority,
    call: BoundFn,
}

impl BoundHandler {
    /// Whether an event of `kind` is delivered to this handler.
    ///
    /// The event must fit the parameter type. With no filters that is enough;
    /// otherwise an exact `only` match or an assignable `value` match is needed.
    pub(crate) fn matches(&self, kind: &Kind) -> bool {
        if !kind.is_assignable_to(&self.accepts) {
            return false;
        }
        if self.value.is_empty() && self.only.is_empty() {
            return true;
        }
        self.only.iter().any(|only| kind.is_exactly(only))
            || self.value.iter().any(|value| kind.is_assignable_to(value))
    }

    /// Run the handler, turning panics into failures.
    pub(crate) fn invoke(&self, event: &dyn Event) -> Result<Propagation, HandlerFailure> {
        panic::catch_unwind(AssertUnwindSafe(|| (self.call)(event)))
            .unwrap_or_else(|payload| Err(HandlerFailure::from_panic(payload.as_ref())))
    }
}

/// One entry of a bus's subscriber list.
pub(crate) struct Registration {
    pub(crate) name: String,
    identity: usize,
    // Keeps the instance alive, and with it the identity, even when the
    // subscriber declared no handlers.
    _instance: Arc<dyn Any + Send + Sync>,
    pub(crate) handlers: Vec<BoundHandler>,
}

impl Registration {
    /// Validate `subscriber`'s table and bind it.
    pub(crate) fn bind<S: Subscriber>(subscriber: Arc<S>) -> EventBusResult<Self> {
        let name = subscriber.name().to_owned();
        let declared = subscriber.subscriptions().into_handlers();

        let accepted = declared
            .iter()
            .enumerate()
            .map(|(index, handler)| accepted_kind(&name, index, handler))
            .collect::<EventBusResult<Vec<_>>>()?;

        let mut handlers: Vec<BoundHandler> = declared
            .into_iter()
            .zip(accepted)
            .enumerate()
            .map(|(index, (handler, accepts))| bind_handler(&subscriber, index, handler, accepts))
            .collect();
        // Stable: equal priorities keep declaration order.
        handlers.sort_by_key(|handler| handler.priority);

        Ok(Self {
            name,
            identity: identity_of(&subscriber),
            _instance: subscriber,
            handlers,
        })
    }

    pub(crate) fn is<S>(&self, subscriber: &Arc<S>) -> bool {
        self.identity == identity_of(subscriber)
    }
}

fn identity_of<S>(subscriber: &Arc<S>) -> usize {
    Arc::as_ptr(subscriber).cast::<()>().addr()
}

fn handler_label<S>(index: usize, handler: &Handler<S>) -> String {
    handler
        .label
        .clone()
        .unwrap_or_else(|| format!("#{index}"))
}

/// Check one handler declaration and return the event kind it accepts.
fn accepted_kind<S>(subscriber: &str, index: usize, handler: &Handler<S>) -> EventBusResult<Kind> {
    let label = handler_label(index, handler);

    let [param] = handler.params.as_slice() else {
        return Err(EventBusError::invalid_subscriber(
            subscriber,
            format!(
                "handler {label} has {} parameters, expected 1",
                handler.params.len()
            ),
        ));
    };

    if !param.is_event() {
        return Err(EventBusError::invalid_subscriber(
            subscriber,
            format!("parameter {param} of handler {label} is not declared as an event kind"),
        ));
    }

    for kind in handler.value.iter().chain(&handler.only) {
        if !kind.is_event() {
            return Err(EventBusError::invalid_subscriber(
                subscriber,
                format!("{kind} in handler {label} is not declared as an event kind"),
            ));
        }
        if !kind.is_assignable_to(param) {
            return Err(EventBusError::invalid_subscriber(
                subscriber,
                format!("{kind} is incompatible with handler {label} accepting {param}"),
            ));
        }
    }

    Ok(*param)
}

fn bind_handler<S: Subscriber>(
    subscriber: &Arc<S>,
    index: usize,
    handler: Handler<S>,
    accepts: Kind,
) -> BoundHandler {
    let label = handler_label(index, &handler);
    let Handler {
        value,
        only,
        priority,
        call,
        ..
    } = handler;

    let instance = Arc::clone(subscriber);
    let call: BoundFn = Arc::new(move |event: &dyn Event| call(&instance, event));

    BoundHandler {
        label,
        accepts,
        value,
        only,
        priority,
        call,
    }
}
