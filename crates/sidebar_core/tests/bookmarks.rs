use std::sync::Once;

use sidebar_core::BookmarkSet;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[test]
fn toggle_flips_membership() {
    init_logging();
    let mut set = BookmarkSet::new();
    assert!(set.toggle("msg_2_HelloWorld"));
    assert!(set.contains("msg_2_HelloWorld"));
    assert!(!set.toggle("msg_2_HelloWorld"));
    assert!(set.is_empty());
}

#[test]
fn snapshot_round_trips_through_from_ids() {
    init_logging();
    let mut set = BookmarkSet::new();
    set.toggle("msg_0_a");
    set.toggle("msg_3_b");

    let reloaded = BookmarkSet::from_ids(set.to_vec());
    assert_eq!(reloaded, BookmarkSet::from_ids(vec!["msg_0_a".into(), "msg_3_b".into()]));
    assert!(reloaded.contains("msg_3_b"));
}

#[test]
fn single_miss_is_forgiven() {
    init_logging();
    let mut set = BookmarkSet::from_ids(vec!["msg_1_x".to_string()]);

    // Mid-mutation scan where the turn is briefly absent.
    assert!(!set.observe_scan(std::iter::empty()));
    assert!(set.contains("msg_1_x"));

    // The turn comes back: miss count resets.
    assert!(!set.observe_scan(["msg_1_x"]));
    assert!(!set.observe_scan(std::iter::empty()));
    assert!(set.contains("msg_1_x"));
}

#[test]
fn two_consecutive_misses_prune_the_id() {
    init_logging();
    let mut set = BookmarkSet::from_ids(vec!["msg_1_x".to_string(), "msg_2_y".to_string()]);

    assert!(!set.observe_scan(["msg_2_y"]));
    assert!(set.observe_scan(["msg_2_y"]));

    assert!(!set.contains("msg_1_x"));
    assert!(set.contains("msg_2_y"));
    assert_eq!(set.len(), 1);
}
