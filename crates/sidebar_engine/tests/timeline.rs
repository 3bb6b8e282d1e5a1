use std::sync::Once;

use pretty_assertions::assert_eq;
use sidebar_engine::adapter::resolve_adapter;
use sidebar_engine::dom::PageDocument;
use sidebar_engine::store::JsonFileStore;
use sidebar_engine::timeline::{ScanOutcome, TimelineIndex};
use sidebar_engine::MemoryBookmarkStore;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

const CHATGPT_HTML: &str = r#"<html><head><title>ChatGPT</title></head><body>
<main>
  <div data-message-author-role="user">How do lifetimes work?</div>
  <div data-message-author-role="assistant">They scope borrows.</div>
  <div data-message-author-role="user">Show an example</div>
</main>
</body></html>"#;

fn memory_timeline() -> TimelineIndex {
    TimelineIndex::new(Box::new(MemoryBookmarkStore::new()), "chatgpt.com", 100, 20)
}

#[test]
fn scan_builds_ordered_entries_with_stable_ids() {
    init_logging();
    let doc = PageDocument::parse(CHATGPT_HTML, "https://chatgpt.com/c/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    let mut timeline = memory_timeline();

    assert_eq!(timeline.scan(&doc, adapter), ScanOutcome::Rebuilt);
    let entries = timeline.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].stable_id, "msg_0_Howdolifetimeswork?");
    assert_eq!(entries[0].preview, "How do lifetimes work?");
    assert_eq!(entries[1].stable_id, "msg_1_Showanexample");
    assert_eq!(entries[1].index, 1);
}

#[test]
fn unchanged_page_short_circuits() {
    init_logging();
    let doc = PageDocument::parse(CHATGPT_HTML, "https://chatgpt.com/c/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    let mut timeline = memory_timeline();

    assert_eq!(timeline.scan(&doc, adapter), ScanOutcome::Rebuilt);
    assert_eq!(timeline.scan(&doc, adapter), ScanOutcome::Unchanged);
}

#[test]
fn appended_turn_forces_rebuild() {
    init_logging();
    let mut doc = PageDocument::parse(CHATGPT_HTML, "https://chatgpt.com/c/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    let mut timeline = memory_timeline();
    timeline.scan(&doc, adapter);

    let main = doc.body().and_then(|b| doc.child_elements(b).first().copied()).unwrap();
    let turn = doc.append_element(main, "div").unwrap();
    doc.set_attr(turn, "data-message-author-role", "user");
    doc.append_text(turn, "Third question");

    assert_eq!(timeline.scan(&doc, adapter), ScanOutcome::Rebuilt);
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.entries()[2].stable_id, "msg_2_Thirdquestion");
}

#[test]
fn bookmarks_survive_node_replacement() {
    init_logging();
    let mut doc = PageDocument::parse(CHATGPT_HTML, "https://chatgpt.com/c/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    let mut timeline = memory_timeline();
    timeline.scan(&doc, adapter);
    assert_eq!(timeline.toggle_bookmark("msg_0_Howdolifetimeswork?"), Some(true));

    // A virtualized re-render replaces every turn node but keeps content
    // and order; the derived ids must not change.
    let old_turns = adapter.user_messages(&doc);
    let texts: Vec<String> = old_turns.iter().map(|&t| doc.text_content(t)).collect();
    let main = doc.body().and_then(|b| doc.child_elements(b).first().copied()).unwrap();
    for turn in old_turns {
        doc.remove_node(turn);
    }
    for text in &texts {
        let turn = doc.append_element(main, "div").unwrap();
        doc.set_attr(turn, "data-message-author-role", "user");
        doc.append_text(turn, text);
    }

    assert_eq!(timeline.scan(&doc, adapter), ScanOutcome::Rebuilt);
    assert!(timeline.entries()[0].bookmarked);
    assert!(timeline.is_bookmarked("msg_0_Howdolifetimeswork?"));
}

#[test]
fn dom_id_wins_over_derived_id() {
    init_logging();
    let html = r#"<html><body>
        <div id="turn-a" data-message-author-role="user">hello</div>
    </body></html>"#;
    let doc = PageDocument::parse(html, "https://chatgpt.com/c/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    let mut timeline = memory_timeline();
    timeline.scan(&doc, adapter);
    assert_eq!(timeline.entries()[0].stable_id, "turn-a");
}

#[test]
fn bookmarks_persist_across_instances() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let doc = PageDocument::parse(CHATGPT_HTML, "https://chatgpt.com/c/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();

    {
        let store = JsonFileStore::new(dir.path());
        let mut timeline = TimelineIndex::new(Box::new(store), "chatgpt.com", 100, 20);
        timeline.scan(&doc, adapter);
        timeline.toggle_bookmark("msg_1_Showanexample");
    }

    let store = JsonFileStore::new(dir.path());
    let mut timeline = TimelineIndex::new(Box::new(store), "chatgpt.com", 100, 20);
    timeline.scan(&doc, adapter);
    assert!(timeline.entries()[1].bookmarked);
}

#[test]
fn bookmark_missing_twice_is_pruned() {
    init_logging();
    let mut doc = PageDocument::parse(CHATGPT_HTML, "https://chatgpt.com/c/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    let mut timeline = memory_timeline();
    timeline.scan(&doc, adapter);
    timeline.toggle_bookmark("msg_0_Howdolifetimeswork?");

    // First rescan without the bookmarked turn: forgiven.
    let turns = adapter.user_messages(&doc);
    doc.remove_node(turns[0]);
    assert_eq!(timeline.scan(&doc, adapter), ScanOutcome::Rebuilt);
    assert!(timeline.is_bookmarked("msg_0_Howdolifetimeswork?"));

    // Second consecutive miss drops it.
    let main = doc.body().and_then(|b| doc.child_elements(b).first().copied()).unwrap();
    let turn = doc.append_element(main, "div").unwrap();
    doc.set_attr(turn, "data-message-author-role", "user");
    doc.append_text(turn, "Another question");
    assert_eq!(timeline.scan(&doc, adapter), ScanOutcome::Rebuilt);
    assert!(!timeline.is_bookmarked("msg_0_Howdolifetimeswork?"));
}
