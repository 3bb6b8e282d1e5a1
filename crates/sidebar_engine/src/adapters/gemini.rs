use std::sync::OnceLock;

use ego_tree::NodeId;

use super::{host_contains, parse_ladder};
use crate::adapter::SiteAdapter;
use crate::dom::{PageDocument, ScrollTarget};
use crate::selector::SelectorList;

/// Angular-based Gemini UI selectors, primary bubble first, then container
/// and attribute-based fallbacks for older variants.
const USER_MESSAGE_SELECTORS: &[&str] = &[
    ".user-query-bubble-with-background",
    ".user-query-bubble-container",
    ".user-query-container",
    "user-query-content .user-query-bubble-with-background",
    "user-query-content",
    "user-query",
    r#"div[aria-label="User message"]"#,
    r#"article[data-author="user"]"#,
    r#"article[data-turn="user"]"#,
    r#"[data-message-author-role="user"]"#,
    r#"div[role="listitem"][data-user="true"]"#,
];

/// The subset of the ladder that identifies a turn element directly, used
/// to locate the first turn when hunting for the scroll container.
const FIRST_TURN_SELECTORS: &[&str] = &[
    ".user-query-bubble-with-background",
    ".user-query-bubble-container",
    ".user-query-container",
    "user-query-content",
];

const SCROLLER_CANDIDATES: &[&str] = &[
    "#chat-history.chat-history-scroll-container",
    r#"[data-test-id="chat-history-container"]"#,
    ".conversation-container",
    "main",
];

const PREVIEW_SELECTORS: &[&str] = &[".query-text", ".user-query-text", "p", "span"];

const INPUT_SELECTORS: &[&str] = &[
    ".ql-editor",
    r#"[contenteditable="true"]"#,
    "textarea",
    r#"[role="textbox"]"#,
    "rich-textarea",
];

pub struct Gemini;

impl Gemini {
    fn ladder() -> &'static [SelectorList] {
        static LADDER: OnceLock<Vec<SelectorList>> = OnceLock::new();
        LADDER.get_or_init(|| parse_ladder(USER_MESSAGE_SELECTORS))
    }

    fn first_turn_ladder() -> &'static [SelectorList] {
        static LADDER: OnceLock<Vec<SelectorList>> = OnceLock::new();
        LADDER.get_or_init(|| parse_ladder(FIRST_TURN_SELECTORS))
    }

    /// Drops empty bubbles and nested duplicates: when a container and its
    /// child both match the ladder, only the outermost element counts.
    fn filter_hits(doc: &PageDocument, hits: Vec<NodeId>) -> Vec<NodeId> {
        let ladder = Self::ladder();
        hits.into_iter()
            .filter(|&id| {
                if doc.text_content(id).trim().is_empty() {
                    return false;
                }
                match doc.parent_element(id) {
                    Some(parent) => !ladder.iter().any(|sel| sel.matches(doc, parent)),
                    None => true,
                }
            })
            .collect()
    }
}

impl SiteAdapter for Gemini {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn matches(&self, doc: &PageDocument) -> bool {
        host_contains(doc, "gemini.google.com")
    }

    fn user_messages(&self, doc: &PageDocument) -> Vec<NodeId> {
        let root = doc.root();
        for list in Self::ladder() {
            let hits = list.query_all(doc, root);
            if hits.is_empty() {
                continue;
            }
            let filtered = Self::filter_hits(doc, hits);
            if !filtered.is_empty() {
                engine_logging::engine_debug!("gemini selector matched {} turns", filtered.len());
                return filtered;
            }
        }
        Vec::new()
    }

    fn message_preview(&self, doc: &PageDocument, node: NodeId) -> Option<String> {
        if let Ok(lines) = SelectorList::parse(".query-text-line") {
            let parts: Vec<String> = lines
                .query_all(doc, node)
                .into_iter()
                .map(|line| doc.text_content(line))
                .collect();
            if !parts.is_empty() {
                return Some(parts.join(" ").trim().to_string());
            }
        }
        for raw in PREVIEW_SELECTORS {
            let Ok(sel) = SelectorList::parse(raw) else {
                continue;
            };
            if let Some(hit) = sel.query(doc, node) {
                let text = doc.text_content(hit).trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    fn scroll_container(&self, doc: &PageDocument) -> ScrollTarget {
        // Walk up from the first user turn looking for a scrollable box.
        let first_turn = Self::first_turn_ladder()
            .iter()
            .find_map(|sel| sel.query(doc, doc.root()));
        if let Some(turn) = first_turn {
            for ancestor in doc.ancestors(turn) {
                let Some(el) = doc.element(ancestor) else {
                    continue;
                };
                if el.tag == "body" {
                    break;
                }
                let overflowing = matches!(el.overflow_y.as_deref(), Some("auto") | Some("scroll"));
                if overflowing && el.scroll.is_some_and(|m| m.is_scrollable()) {
                    return ScrollTarget::Node(ancestor);
                }
            }
        }
        for raw in SCROLLER_CANDIDATES {
            let Ok(sel) = SelectorList::parse(raw) else {
                continue;
            };
            if let Some(hit) = sel.query(doc, doc.root()) {
                if doc
                    .element(hit)
                    .and_then(|el| el.scroll)
                    .is_some_and(|m| m.is_scrollable())
                {
                    return ScrollTarget::Node(hit);
                }
            }
        }
        match doc.scrolling_element() {
            Some(scrolling) => ScrollTarget::Node(scrolling),
            None => ScrollTarget::Window,
        }
    }

    fn input_selectors(&self) -> &'static [&'static str] {
        INPUT_SELECTORS
    }

    fn input_text(&self, doc: &PageDocument, node: NodeId) -> String {
        let text = doc.text_content(node);
        if text.is_empty() {
            doc.input_value(node).unwrap_or_default()
        } else {
            text
        }
    }
}
