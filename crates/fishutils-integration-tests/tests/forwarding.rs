//! Integration tests for the forwarding graph and duplicate suppression.
//!
//! Covers hook/unhook edits, rejection of self edges and cycles, and how
//! signatures decide whether a bus reached along several paths delivers an
//! event once or once per path.

use std::sync::Arc;

use fishutils_events::{EventBus, EventBusError, Listener, Priority};
use fishutils_test::{BaseEvent, Diamond, OrderLog, Recorder, setup_test_logging_default};

fn record(bus: &EventBus, name: &str, log: &OrderLog) {
    bus.subscribe(Arc::new(
        Recorder::new(name, log).on::<BaseEvent>("seen", Priority::Normal),
    ))
    .unwrap();
}

#[test]
fn test_self_hook_rejected() {
    setup_test_logging_default();
    let bus = EventBus::new();

    let err = bus.hook(&bus).unwrap_err();
    assert!(matches!(err, EventBusError::SelfInheritance { bus: id } if id == bus.id()));
    assert!(err.is_structural());
    assert!(bus.dependents().is_empty());
}

#[test]
fn test_two_bus_cycle_rejected_and_graph_unchanged() {
    let a = EventBus::new();
    let b = EventBus::new();

    a.hook(&b).unwrap();
    let err = b.hook(&a).unwrap_err();
    assert!(matches!(err, EventBusError::RecursiveInheritance { .. }));

    assert_eq!(b.dependents(), vec![a.clone()]);
    assert!(a.dependents().is_empty());
    assert!(a.is_hooked_to(&b));
    assert!(!b.is_hooked_to(&a));
}

#[test]
fn test_transitive_cycle_rejected() {
    let a = EventBus::new();
    let b = EventBus::new();
    let c = EventBus::new();

    // a -> b -> c
    b.hook(&a).unwrap();
    c.hook(&b).unwrap();

    let err = a.hook(&c).unwrap_err();
    assert!(matches!(
        err,
        EventBusError::RecursiveInheritance { child, parent } if child == a.id() && parent == c.id()
    ));
    assert!(c.dependents().is_empty());
}

#[test]
fn test_cycle_rejected_after_unhook_is_allowed() {
    let a = EventBus::new();
    let b = EventBus::new();

    a.hook(&b).unwrap();
    assert!(b.hook(&a).is_err());

    assert!(a.unhook(&b));
    b.hook(&a).unwrap();
    assert!(b.is_hooked_to(&a));
}

#[test]
fn test_unhook_missing_edge_is_noop() {
    let a = EventBus::new();
    let b = EventBus::new();
    assert!(!a.unhook(&b));
}

#[test]
fn test_rehook_keeps_single_edge() {
    let parent = EventBus::new();
    let child = EventBus::new();
    let log = OrderLog::new();
    record(&child, "child", &log);

    child.hook(&parent).unwrap();
    child.hook(&parent).unwrap();
    assert_eq!(parent.dependents().len(), 1);

    parent.fire(&mut BaseEvent::new("once")).unwrap();
    assert_eq!(log.count("child.seen"), 1);
}

#[test]
fn test_forwarding_reaches_every_descendant() {
    let root = EventBus::new();
    let middle = EventBus::new();
    let leaf = EventBus::new();
    middle.hook(&root).unwrap();
    leaf.hook(&middle).unwrap();

    let log = OrderLog::new();
    record(&root, "root", &log);
    record(&middle, "middle", &log);
    record(&leaf, "leaf", &log);

    root.fire(&mut BaseEvent::new("down")).unwrap();
    assert_eq!(log.entries(), vec!["root.seen", "middle.seen", "leaf.seen"]);

    log.clear();
    middle.fire(&mut BaseEvent::new("mid")).unwrap();
    assert_eq!(log.entries(), vec!["middle.seen", "leaf.seen"]);
}

#[test]
fn test_unhooked_bus_no_longer_receives() {
    let parent = EventBus::new();
    let child = EventBus::new();
    let log = OrderLog::new();
    record(&child, "child", &log);

    child.hook(&parent).unwrap();
    parent.fire(&mut BaseEvent::new("a")).unwrap();
    assert!(child.unhook(&parent));
    parent.fire(&mut BaseEvent::new("b")).unwrap();

    assert_eq!(log.count("child.seen"), 1);
}

#[test]
fn test_diamond_delivers_once_with_dedup() {
    let diamond = Diamond::new(false);
    let log = OrderLog::new();
    record(&diamond.bottom, "bottom", &log);

    let mut event = BaseEvent::new("diamond");
    diamond.top.fire(&mut event).unwrap();

    assert_eq!(log.count("bottom.seen"), 1);
    assert!(event.signatures.is_signed(diamond.bottom.id()));
    assert_eq!(event.signatures.len(), 4);
}

#[test]
fn test_diamond_delivers_per_path_with_duplicates() {
    let diamond = Diamond::new(true);
    let log = OrderLog::new();
    record(&diamond.bottom, "bottom", &log);

    let mut event = BaseEvent::new("diamond");
    diamond.top.fire(&mut event).unwrap();

    assert_eq!(log.count("bottom.seen"), 2);
    assert!(!event.signatures.is_signed(diamond.bottom.id()));
}

#[test]
fn test_refiring_signed_event_is_skipped() {
    let bus = EventBus::new();
    let log = OrderLog::new();
    record(&bus, "bus", &log);

    let mut event = BaseEvent::new("again");
    bus.fire(&mut event).unwrap();
    bus.fire(&mut event).unwrap();
    assert_eq!(log.count("bus.seen"), 1);

    // A clone is a new instance and carries no signatures.
    let mut copy = event.clone();
    bus.fire(&mut copy).unwrap();
    assert_eq!(log.count("bus.seen"), 2);
}

#[test]
fn test_duplicate_bus_processes_every_fire() {
    let bus = EventBus::with_duplicates();
    let log = OrderLog::new();
    record(&bus, "bus", &log);

    let mut event = BaseEvent::new("again");
    bus.fire(&mut event).unwrap();
    bus.fire(&mut event).unwrap();
    assert_eq!(log.count("bus.seen"), 2);
}

#[test]
fn test_hook_during_dispatch_applies_to_next_fire() {
    let parent = EventBus::new();
    let late = EventBus::new();
    let log = OrderLog::new();
    record(&late, "late", &log);

    let hook_parent = parent.clone();
    let hook_late = late.clone();
    parent
        .subscribe(Arc::new(Listener::new("hooker").on(
            move |_: &BaseEvent| {
                hook_late.hook(&hook_parent).unwrap();
            },
        )))
        .unwrap();

    parent.fire(&mut BaseEvent::new("first")).unwrap();
    assert!(late.is_hooked_to(&parent));
    assert_eq!(log.count("late.seen"), 0);

    parent.fire(&mut BaseEvent::new("second")).unwrap();
    assert_eq!(log.count("late.seen"), 1);
}

#[test]
fn test_bus_ids_are_unique_and_released() {
    let ids: Vec<_> = (0..64).map(|_| EventBus::new()).collect();
    let mut seen = std::collections::HashSet::new();
    for bus in &ids {
        assert!(seen.insert(bus.id()));
        assert!(bus.id().is_live());
    }

    let id = ids[0].id();
    drop(ids);
    assert!(!id.is_live());
}

#[test]
fn test_concurrent_hooks_never_form_cycle() {
    let a = EventBus::new();
    let b = EventBus::new();

    let handles: Vec<_> = (0..8_u32)
        .map(|i| {
            let (a, b) = (a.clone(), b.clone());
            std::thread::spawn(move || {
                if i.is_multiple_of(2) {
                    let _ = a.hook(&b);
                } else {
                    let _ = b.hook(&a);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(!(a.is_hooked_to(&b) && b.is_hooked_to(&a)));
    assert!(a.is_hooked_to(&b) || b.is_hooked_to(&a));
}
