//! Event bus error types and the handler failure policy.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::identity::BusId;

/// Errors returned by event bus operations.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// A subscriber declared a handler with an unusable shape. Nothing from
    /// the subscriber was registered.
    #[error("invalid subscriber {subscriber}: {reason}")]
    InvalidSubscriber {
        /// Name of the rejected subscriber.
        subscriber: String,
        /// What was wrong with its handler table.
        reason: String,
    },

    /// A bus was hooked to itself.
    #[error("bus {bus} cannot inherit from itself")]
    SelfInheritance {
        /// The bus in question.
        bus: BusId,
    },

    /// Hooking would close a forwarding cycle.
    #[error("recursive inheritance: bus {parent} already receives events from bus {child}")]
    RecursiveInheritance {
        /// The bus that asked to be hooked.
        child: BusId,
        /// The bus it asked to receive events from.
        parent: BusId,
    },

    /// A handler failed and the error handler aborted the dispatch.
    #[error(transparent)]
    HandlerInvocation(#[from] HandlerInvocationError),
}

impl EventBusError {
    /// Whether this error concerns the forwarding graph.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::SelfInheritance { .. } | Self::RecursiveInheritance { .. }
        )
    }

    pub(crate) fn invalid_subscriber(subscriber: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSubscriber {
            subscriber: subscriber.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Result type for event bus operations.
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Why a single handler invocation failed.
#[derive(Debug, Error)]
pub enum HandlerFailure {
    /// The handler returned an error.
    #[error("{0}")]
    Error(Box<dyn std::error::Error + Send + Sync>),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// The event could not be viewed as the handler's parameter type.
    #[error("event cannot be viewed as {expected}")]
    ViewUnavailable {
        /// Name of the expected event kind.
        expected: &'static str,
    },
}

impl HandlerFailure {
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Self::Panic(message)
    }
}

/// A handler failure, with where it happened.
#[derive(Debug, Error)]
#[error("handler {handler} of {subscriber} failed on {event} (bus {bus}): {failure}")]
pub struct HandlerInvocationError {
    /// Bus that was dispatching.
    pub bus: BusId,
    /// Name of the subscriber owning the handler.
    pub subscriber: String,
    /// Handler label.
    pub handler: String,
    /// Name of the fired event's kind.
    pub event: &'static str,
    /// The failure itself.
    pub failure: HandlerFailure,
}

/// What the bus does after reporting a handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Keep dispatching to the remaining handlers and buses.
    Continue,
    /// Stop the whole fire call and return the failure to its caller.
    Abort,
}

type ErrorCallback = dyn Fn(&HandlerInvocationError) -> ErrorAction + Send + Sync;

/// Policy invoked whenever a handler fails during dispatch.
///
/// The default policy aborts the in-flight fire call.
#[derive(Clone)]
pub struct ErrorHandler {
    policy: &'static str,
    callback: Arc<ErrorCallback>,
}

impl ErrorHandler {
    /// A custom policy.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&HandlerInvocationError) -> ErrorAction + Send + Sync + 'static,
    {
        Self {
            policy: "custom",
            callback: Arc::new(callback),
        }
    }

    /// Abort the fire call on the first failure.
    #[must_use]
    pub fn abort() -> Self {
        Self {
            policy: "abort",
            callback: Arc::new(|_| ErrorAction::Abort),
        }
    }

    /// Log the failure and keep dispatching.
    #[must_use]
    pub fn log() -> Self {
        Self {
            policy: "log",
            callback: Arc::new(|error| {
                warn!(
                    bus = %error.bus,
                    subscriber = %error.subscriber,
                    handler = %error.handler,
                    event = error.event,
                    error = %error.failure,
                    "Event handler failed"
                );
                ErrorAction::Continue
            }),
        }
    }

    /// Drop failures silently and keep dispatching.
    #[must_use]
    pub fn ignore() -> Self {
        Self {
            policy: "ignore",
            callback: Arc::new(|_| ErrorAction::Continue),
        }
    }

    /// Apply the policy to one failure.
    #[must_use]
    pub fn handle(&self, error: &HandlerInvocationError) -> ErrorAction {
        (self.callback)(error)
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::abort()
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("policy", &self.policy)
            .finish()
    }
}
