use std::sync::Once;

use sidebar_engine::dom::{PageDocument, ScrollMetrics, ScrollTarget};
use sidebar_engine::resolve_adapter;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

const CHATGPT_HTML: &str = r#"<html><head><title>ChatGPT</title></head><body>
<main>
  <article data-testid="conversation-turn-1" data-turn="user">
    <div data-message-author-role="user">How do lifetimes work?</div>
  </article>
  <article data-testid="conversation-turn-2" data-turn="assistant">
    <div data-message-author-role="assistant">They scope borrows.</div>
  </article>
  <article data-testid="conversation-turn-3" data-turn="user">
    <div data-message-author-role="user">Show an example</div>
  </article>
</main>
<div id="prompt-textarea" contenteditable="true"></div>
</body></html>"#;

const GEMINI_HTML: &str = r#"<html><head><title>Gemini</title></head><body>
<main>
  <div class="conversation-container">
    <user-query-content>
      <div class="user-query-bubble-with-background">
        <div class="query-text"><span class="query-text-line">first question</span></div>
      </div>
    </user-query-content>
    <user-query-content>
      <div class="user-query-bubble-with-background">
        <div class="query-text"><span class="query-text-line">second</span>
        <span class="query-text-line">question</span></div>
      </div>
    </user-query-content>
  </div>
</main>
</body></html>"#;

const CLAUDE_HTML: &str = r#"<html><head><title>Claude</title></head><body>
<div data-testid="user-message">hello there</div>
<div data-testid="user-message">second turn</div>
</body></html>"#;

const DEEPSEEK_HTML: &str = r#"<html><head><title>DeepSeek</title></head><body>
<div class="ds-message--user f2x1">question one</div>
<div class="ds-message--assistant">answer</div>
</body></html>"#;

const KIMI_HTML: &str = r#"<html><head><title>Kimi</title></head><body>
<div class="chat-item user-message-box">turn text</div>
</body></html>"#;

#[test]
fn each_provider_resolves_its_own_adapter() {
    init_logging();
    let cases = [
        (CHATGPT_HTML, "https://chatgpt.com/c/abc", "chatgpt"),
        (GEMINI_HTML, "https://gemini.google.com/app/abc", "gemini"),
        (CLAUDE_HTML, "https://claude.ai/chat/abc", "claude"),
        (DEEPSEEK_HTML, "https://chat.deepseek.com/a/chat", "deepseek"),
        (KIMI_HTML, "https://kimi.moonshot.cn/chat/abc", "kimi"),
    ];
    for (html, location, expected) in cases {
        let doc = PageDocument::parse(html, location).unwrap();
        let adapter = resolve_adapter(&doc).unwrap();
        assert_eq!(adapter.name(), expected, "for {location}");
    }
}

#[test]
fn unknown_host_resolves_no_adapter() {
    init_logging();
    let doc = PageDocument::parse("<html><body></body></html>", "https://example.com/").unwrap();
    assert!(resolve_adapter(&doc).is_none());
}

#[test]
fn chatgpt_extracts_only_user_turns() {
    init_logging();
    let doc = PageDocument::parse(CHATGPT_HTML, "https://chatgpt.com/c/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    let turns = adapter.user_messages(&doc);
    assert_eq!(turns.len(), 2);
    assert_eq!(doc.text_content(turns[0]).trim(), "How do lifetimes work?");
    assert_eq!(doc.text_content(turns[1]).trim(), "Show an example");
}

#[test]
fn gemini_deduplicates_nested_ladder_hits() {
    init_logging();
    let doc = PageDocument::parse(GEMINI_HTML, "https://gemini.google.com/app/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    // Bubble and its custom-element container both appear in the ladder;
    // only the outermost per turn may count.
    let turns = adapter.user_messages(&doc);
    assert_eq!(turns.len(), 2);
}

#[test]
fn gemini_preview_joins_text_lines() {
    init_logging();
    let doc = PageDocument::parse(GEMINI_HTML, "https://gemini.google.com/app/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    let turns = adapter.user_messages(&doc);
    let preview = adapter.message_preview(&doc, turns[1]).unwrap();
    assert_eq!(preview, "second question");
}

#[test]
fn gemini_scroll_container_prefers_scrollable_ancestor() {
    init_logging();
    let mut doc = PageDocument::parse(GEMINI_HTML, "https://gemini.google.com/app/abc").unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    let turns = adapter.user_messages(&doc);

    // Without any scrollable ancestor the adapter falls back to the window.
    assert_eq!(adapter.scroll_container(&doc), ScrollTarget::Window);

    let container = doc
        .ancestors(turns[0])
        .into_iter()
        .find(|&id| {
            doc.element(id)
                .is_some_and(|el| el.classes.iter().any(|c| c == "conversation-container"))
        })
        .unwrap();
    doc.set_overflow_y(container, "auto");
    doc.set_scroll_metrics(
        container,
        ScrollMetrics {
            scroll_height: 3000.0,
            client_height: 700.0,
            scroll_top: 0.0,
        },
    );
    assert_eq!(
        adapter.scroll_container(&doc),
        ScrollTarget::Node(container)
    );
}

#[test]
fn empty_conversation_yields_no_turns() {
    init_logging();
    let doc = PageDocument::parse(
        "<html><body><main></main></body></html>",
        "https://chatgpt.com/",
    )
    .unwrap();
    let adapter = resolve_adapter(&doc).unwrap();
    assert!(adapter.user_messages(&doc).is_empty());
}
