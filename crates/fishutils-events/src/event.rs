//! Event types, kind tags and per-instance signatures.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::identity::BusId;

/// Static description of a type that may appear in a handler declaration.
///
/// Event kinds carry a link to their parent kind, forming the chain used for
/// assignability checks. Kinds built with [`Kind::of`] describe arbitrary
/// non-event types and never match anything at dispatch time, even when the
/// type itself implements [`Event`]. Two kinds are equal only when they share
/// both the type and the event flag.
#[derive(Clone, Copy)]
pub struct Kind {
    id: TypeId,
    name: &'static str,
    is_event: bool,
    parent: Option<fn() -> Kind>,
}

impl Kind {
    /// Kind for an arbitrary, non-event type.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            is_event: false,
            parent: None,
        }
    }

    /// Kind for an event type.
    #[must_use]
    pub fn event<E: EventType>() -> Self {
        E::event_kind()
    }

    /// Kind for an event type without a parent. Used by [`impl_event!`].
    #[doc(hidden)]
    #[must_use]
    pub fn root<E: Event>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<E>(),
            name,
            is_event: true,
            parent: None,
        }
    }

    /// Kind for an event type that embeds `P`. Used by [`impl_event!`].
    #[doc(hidden)]
    #[must_use]
    pub fn derived<E: Event, P: EventType>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<E>(),
            name,
            is_event: true,
            parent: Some(P::event_kind),
        }
    }

    /// The type identifier behind this kind.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this kind describes an event type.
    #[must_use]
    pub fn is_event(&self) -> bool {
        self.is_event
    }

    /// The parent kind, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Kind> {
        self.parent.map(|parent| parent())
    }

    /// Exact identity match.
    #[must_use]
    pub fn is_exactly(&self, other: &Kind) -> bool {
        self.id == other.id
    }

    /// Whether a value of this kind can be delivered where `target` is expected,
    /// i.e. `target` is this kind or one of its ancestors.
    #[must_use]
    pub fn is_assignable_to(&self, target: &Kind) -> bool {
        self.ancestry().any(|kind| kind.is_exactly(target))
    }

    /// This kind followed by each of its ancestors, nearest first.
    pub fn ancestry(&self) -> impl Iterator<Item = Kind> + use<> {
        std::iter::successors(Some(*self), Kind::parent)
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.is_exactly(other) && self.is_event == other.is_event
    }
}

impl Eq for Kind {}

impl Hash for Kind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kind")
            .field("name", &self.name)
            .field("is_event", &self.is_event)
            .field("parent", &self.parent().map(|parent| parent.name))
            .finish()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Buses that have already processed one event instance.
///
/// Cloning yields an empty set: a cloned event is a new instance and has not
/// been delivered anywhere yet.
#[derive(Debug, Default)]
pub struct Signatures {
    signed: HashSet<BusId>,
}

impl Signatures {
    /// Create an empty signature set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `bus` has signed this event.
    #[must_use]
    pub fn is_signed(&self, bus: BusId) -> bool {
        self.signed.contains(&bus)
    }

    /// Number of buses that signed this event.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signed.len()
    }

    /// Whether no bus has signed this event yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signed.is_empty()
    }

    /// Returns `true` if the signature was not present before.
    pub(crate) fn sign(&mut self, bus: BusId) -> bool {
        self.signed.insert(bus)
    }
}

impl Clone for Signatures {
    fn clone(&self) -> Self {
        Self::default()
    }
}

/// An event that can be fired on a bus.
///
/// Implement this with [`impl_event!`] rather than by hand.
pub trait Event: Any + Send + Sync + 'static {
    /// The exact runtime kind of this event.
    fn kind(&self) -> Kind;

    /// Signatures of the buses that processed this instance.
    fn signatures(&self) -> &Signatures;

    /// Mutable access to the signatures, used while firing.
    fn signatures_mut(&mut self) -> &mut Signatures;

    /// View this event as the kind identified by `target`: either the event
    /// itself or one of the parent events it embeds.
    fn upcast(&self, target: TypeId) -> Option<&dyn Any>;
}

impl dyn Event {
    /// View this event as `E`, which may be its own type or an ancestor.
    #[must_use]
    pub fn downcast_ref<E: EventType>(&self) -> Option<&E> {
        self.upcast(TypeId::of::<E>())?.downcast_ref::<E>()
    }

    /// Whether this event is an `E` or derives from one.
    #[must_use]
    pub fn is<E: EventType>(&self) -> bool {
        self.kind().is_assignable_to(&E::event_kind())
    }
}

impl fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind().name())
            .field("signatures", &self.signatures().len())
            .finish()
    }
}

/// Static side of [`Event`].
pub trait EventType: Event + Sized {
    /// The kind tag of this event type.
    fn event_kind() -> Kind;
}

/// Implement [`Event`] and [`EventType`] for a struct.
///
/// Root events need a `signatures: Signatures` field:
///
/// ```rust
/// use fishutils_events::{Signatures, impl_event};
///
/// #[derive(Debug, Default)]
/// struct Connected {
///     signatures: Signatures,
///     peer: String,
/// }
/// impl_event!(Connected);
/// ```
///
/// Derived events embed their parent event and name the field holding it.
/// Signatures are shared with the embedded parent:
///
/// ```rust
/// use fishutils_events::{Signatures, impl_event};
///
/// # #[derive(Debug, Default)]
/// # struct Connected { signatures: Signatures, peer: String }
/// # impl_event!(Connected);
/// #[derive(Debug, Default)]
/// struct Reconnected {
///     connected: Connected,
///     attempts: u32,
/// }
/// impl_event!(Reconnected: connected as Connected);
/// ```
///
/// Generic events list their parameters in brackets first. Each
/// instantiation is its own kind, named after its full type:
///
/// ```rust
/// use fishutils_events::{Kind, Signatures, impl_event};
///
/// #[derive(Debug, Default)]
/// struct Sample<T> {
///     signatures: Signatures,
///     value: T,
/// }
/// impl_event!([T: Send + Sync + 'static] Sample<T>);
///
/// assert_ne!(Kind::event::<Sample<u8>>(), Kind::event::<Sample<u16>>());
/// ```
#[macro_export]
macro_rules! impl_event {
    (@root [$($g:tt)*] $ty:ty, $name:expr) => {
        impl<$($g)*> $crate::Event for $ty {
            fn kind(&self) -> $crate::Kind {
                <Self as $crate::EventType>::event_kind()
            }

            fn signatures(&self) -> &$crate::Signatures {
                &self.signatures
            }

            fn signatures_mut(&mut self) -> &mut $crate::Signatures {
                &mut self.signatures
            }

            fn upcast(
                &self,
                target: ::std::any::TypeId,
            ) -> ::std::option::Option<&dyn ::std::any::Any> {
                if target == ::std::any::TypeId::of::<Self>() {
                    ::std::option::Option::Some(self as &dyn ::std::any::Any)
                } else {
                    ::std::option::Option::None
                }
            }
        }

        impl<$($g)*> $crate::EventType for $ty {
            fn event_kind() -> $crate::Kind {
                $crate::Kind::root::<Self>($name)
            }
        }
    };
    (@derived [$($g:tt)*] $ty:ty, $field:ident, $parent:ty, $name:expr) => {
        impl<$($g)*> $crate::Event for $ty {
            fn kind(&self) -> $crate::Kind {
                <Self as $crate::EventType>::event_kind()
            }

            fn signatures(&self) -> &$crate::Signatures {
                let parent: &$parent = &self.$field;
                $crate::Event::signatures(parent)
            }

            fn signatures_mut(&mut self) -> &mut $crate::Signatures {
                let parent: &mut $parent = &mut self.$field;
                $crate::Event::signatures_mut(parent)
            }

            fn upcast(
                &self,
                target: ::std::any::TypeId,
            ) -> ::std::option::Option<&dyn ::std::any::Any> {
                if target == ::std::any::TypeId::of::<Self>() {
                    ::std::option::Option::Some(self as &dyn ::std::any::Any)
                } else {
                    let parent: &$parent = &self.$field;
                    $crate::Event::upcast(parent, target)
                }
            }
        }

        impl<$($g)*> $crate::EventType for $ty {
            fn event_kind() -> $crate::Kind {
                $crate::Kind::derived::<Self, $parent>($name)
            }
        }
    };
    ([$($g:tt)*] $ty:ty : $field:ident as $parent:ty) => {
        $crate::impl_event!(
            @derived [$($g)*] $ty, $field, $parent, ::std::any::type_name::<$ty>()
        );
    };
    ([$($g:tt)*] $ty:ty) => {
        $crate::impl_event!(@root [$($g)*] $ty, ::std::any::type_name::<$ty>());
    };
    ($ty:ty : $field:ident as $parent:ty) => {
        $crate::impl_event!(@derived [] $ty, $field, $parent, ::std::stringify!($ty));
    };
    ($ty:ty) => {
        $crate::impl_event!(@root [] $ty, ::std::stringify!($ty));
    };
}

/// Root event tagged with the type of payload it describes.
///
/// Concrete events embed a `GenericEvent<T>` as their parent, so a handler
/// accepting `GenericEvent<String>` sees every event built around a string
/// payload while `GenericEvent<u32>` stays a separate kind:
///
/// ```rust
/// use fishutils_events::{Event, GenericEvent, Kind, impl_event};
///
/// #[derive(Debug, Default)]
/// struct Loaded {
///     generic: GenericEvent<String>,
///     body: String,
/// }
/// impl_event!(Loaded: generic as GenericEvent<String>);
///
/// let loaded = Loaded::default();
/// let event: &dyn Event = &loaded;
/// assert!(event.is::<GenericEvent<String>>());
/// assert!(!event.is::<GenericEvent<u32>>());
/// assert_eq!(loaded.generic.payload_kind(), Kind::of::<String>());
/// ```
pub struct GenericEvent<T> {
    signatures: Signatures,
    payload: Kind,
    _payload: PhantomData<fn() -> T>,
}

impl<T: 'static> GenericEvent<T> {
    /// Create an unsigned event for payloads of type `T`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signatures: Signatures::new(),
            payload: Kind::of::<T>(),
            _payload: PhantomData,
        }
    }

    /// Kind of the payload type. Never an event kind.
    #[must_use]
    pub fn payload_kind(&self) -> Kind {
        self.payload
    }
}

impl<T: 'static> Default for GenericEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for GenericEvent<T> {
    fn clone(&self) -> Self {
        Self {
            signatures: self.signatures.clone(),
            payload: self.payload,
            _payload: PhantomData,
        }
    }
}

impl<T> fmt::Debug for GenericEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericEvent")
            .field("payload", &self.payload.name())
            .field("signatures", &self.signatures)
            .finish()
    }
}

crate::impl_event!([T: 'static] GenericEvent<T>);
