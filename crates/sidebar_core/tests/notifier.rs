use std::sync::Once;
use std::time::{Duration, Instant};

use sidebar_core::NotifierState;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

const DEBOUNCE: Duration = Duration::from_millis(100);

#[test]
fn immediate_trigger_bypasses_debounce() {
    init_logging();
    let mut notifier = NotifierState::new(DEBOUNCE);
    let now = Instant::now();

    assert_eq!(
        notifier.trigger("a".into(), true, now),
        Some("a".to_string())
    );
    assert_eq!(notifier.next_deadline(), None);
    assert_eq!(notifier.last_emitted(), Some("a"));
}

#[test]
fn unchanged_payload_emits_exactly_once() {
    init_logging();
    let mut notifier = NotifierState::new(DEBOUNCE);
    let now = Instant::now();

    assert!(notifier.trigger("a".into(), true, now).is_some());
    // Same descriptor again: no-op, no timer armed.
    assert_eq!(notifier.trigger("a".into(), false, now), None);
    assert_eq!(notifier.next_deadline(), None);
    assert_eq!(notifier.poll(now + DEBOUNCE * 2), None);
}

#[test]
fn burst_collapses_to_latest_payload() {
    init_logging();
    let mut notifier = NotifierState::new(DEBOUNCE);
    let start = Instant::now();

    assert_eq!(notifier.trigger("a".into(), false, start), None);
    assert_eq!(
        notifier.trigger("b".into(), false, start + Duration::from_millis(30)),
        None
    );
    assert_eq!(
        notifier.trigger("c".into(), false, start + Duration::from_millis(60)),
        None
    );

    // Not yet due: the last trigger restarted the window.
    assert_eq!(notifier.poll(start + Duration::from_millis(100)), None);
    // One emission, reflecting the state at the last trigger.
    assert_eq!(
        notifier.poll(start + Duration::from_millis(160)),
        Some("c".to_string())
    );
    assert_eq!(notifier.poll(start + Duration::from_millis(300)), None);
}

#[test]
fn pending_payload_equal_to_last_emission_is_dropped() {
    init_logging();
    let mut notifier = NotifierState::new(DEBOUNCE);
    let start = Instant::now();

    assert!(notifier.trigger("a".into(), true, start).is_some());
    // Page flaps to "b" and back to "a" within the window.
    notifier.trigger("b".into(), false, start);
    notifier.trigger("a".into(), false, start + Duration::from_millis(10));

    assert_eq!(notifier.poll(start + Duration::from_secs(1)), None);
    assert_eq!(notifier.last_emitted(), Some("a"));
}

#[test]
fn immediate_trigger_cancels_pending_window() {
    init_logging();
    let mut notifier = NotifierState::new(DEBOUNCE);
    let start = Instant::now();

    notifier.trigger("a".into(), false, start);
    assert!(notifier.next_deadline().is_some());

    assert!(notifier.trigger("b".into(), true, start).is_some());
    assert_eq!(notifier.next_deadline(), None);
    assert_eq!(notifier.poll(start + Duration::from_secs(1)), None);
}
