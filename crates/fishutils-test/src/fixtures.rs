//! Fixture events and bus topologies.
//!
//! The events form one chain, `LeafEvent` → `DerivedEvent` → `BaseEvent`,
//! plus `UnrelatedEvent` outside it.

use fishutils_events::{EventBus, Signatures, impl_event};

/// Root of the fixture event chain.
#[derive(Debug, Clone, Default)]
pub struct BaseEvent {
    /// Buses that processed this instance.
    pub signatures: Signatures,
    /// Free-form payload for assertions.
    pub label: String,
}
impl_event!(BaseEvent);

impl BaseEvent {
    /// A base event carrying `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            signatures: Signatures::new(),
            label: label.into(),
        }
    }
}

/// Derives from [`BaseEvent`].
#[derive(Debug, Clone, Default)]
pub struct DerivedEvent {
    /// The embedded parent event.
    pub base: BaseEvent,
}
impl_event!(DerivedEvent: base as BaseEvent);

impl DerivedEvent {
    /// A derived event carrying `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            base: BaseEvent::new(label),
        }
    }
}

/// Derives from [`DerivedEvent`].
#[derive(Debug, Clone, Default)]
pub struct LeafEvent {
    /// The embedded parent event.
    pub derived: DerivedEvent,
}
impl_event!(LeafEvent: derived as DerivedEvent);

impl LeafEvent {
    /// A leaf event carrying `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            derived: DerivedEvent::new(label),
        }
    }
}

/// An event unrelated to the fixture chain.
#[derive(Debug, Clone, Default)]
pub struct UnrelatedEvent {
    /// Buses that processed this instance.
    pub signatures: Signatures,
}
impl_event!(UnrelatedEvent);

/// Four buses where `bottom` is reached from `top` along two paths:
/// `top → left → bottom` and `top → right → bottom`.
#[derive(Debug, Clone)]
pub struct Diamond {
    /// Where events are fired.
    pub top: EventBus,
    /// First intermediate bus.
    pub left: EventBus,
    /// Second intermediate bus.
    pub right: EventBus,
    /// The bus reached twice.
    pub bottom: EventBus,
}

impl Diamond {
    /// Build the diamond. Only `bottom` uses `bottom_processes_duplicates`;
    /// the other buses suppress duplicates.
    ///
    /// # Panics
    ///
    /// Panics if the edges cannot be added, which would be a bus bug.
    #[must_use]
    pub fn new(bottom_processes_duplicates: bool) -> Self {
        let top = EventBus::builder().with_name("top").build();
        let left = EventBus::builder().with_name("left").build();
        let right = EventBus::builder().with_name("right").build();
        let bottom = EventBus::builder()
            .with_name("bottom")
            .with_duplicates(bottom_processes_duplicates)
            .build();

        left.hook(&top).expect("left hooks to top");
        right.hook(&top).expect("right hooks to top");
        bottom.hook(&left).expect("bottom hooks to left");
        bottom.hook(&right).expect("bottom hooks to right");

        Self {
            top,
            left,
            right,
            bottom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishutils_events::{Event, EventType, Kind};

    #[test]
    fn test_fixture_chain() {
        let names: Vec<_> = Kind::event::<LeafEvent>()
            .ancestry()
            .map(|kind| kind.name())
            .collect();
        assert_eq!(names, vec!["LeafEvent", "DerivedEvent", "BaseEvent"]);
        assert!(
            !UnrelatedEvent::event_kind().is_assignable_to(&BaseEvent::event_kind())
        );
    }

    #[test]
    fn test_labels_reach_base() {
        let leaf = LeafEvent::new("deep");
        let event: &dyn Event = &leaf;
        assert_eq!(event.downcast_ref::<BaseEvent>().unwrap().label, "deep");
    }

    #[test]
    fn test_diamond_edges() {
        let diamond = Diamond::new(false);
        assert_eq!(diamond.top.dependents().len(), 2);
        assert!(diamond.bottom.is_hooked_to(&diamond.left));
        assert!(diamond.bottom.is_hooked_to(&diamond.right));
        assert!(!diamond.bottom.processes_duplicates());
    }
}
