use std::sync::OnceLock;

use ego_tree::NodeId;

use super::{first_nonempty_match, host_contains, parse_ladder};
use crate::adapter::SiteAdapter;
use crate::dom::{PageDocument, ScrollTarget};
use crate::selector::SelectorList;

/// Several selector generations coexist in the wild; ordered newest first.
const USER_MESSAGE_SELECTORS: &[&str] = &[
    r#"[data-message-author-role="user"]"#,
    r#"article[data-testid^="conversation-turn-"][data-turn="user"]"#,
    r#"div[data-message-author-role="user"]"#,
];

const INPUT_SELECTORS: &[&str] = &[
    "#prompt-textarea",
    ".ProseMirror",
    r#"[contenteditable="true"]"#,
];

const SCROLLER_SELECTOR: &str = r#"[class*="overflow-y-auto"], [class*="overflow-auto"]"#;

pub struct ChatGpt;

impl ChatGpt {
    fn ladder() -> &'static [SelectorList] {
        static LADDER: OnceLock<Vec<SelectorList>> = OnceLock::new();
        LADDER.get_or_init(|| parse_ladder(USER_MESSAGE_SELECTORS))
    }
}

impl SiteAdapter for ChatGpt {
    fn name(&self) -> &'static str {
        "chatgpt"
    }

    fn matches(&self, doc: &PageDocument) -> bool {
        host_contains(doc, "chatgpt.com")
    }

    fn user_messages(&self, doc: &PageDocument) -> Vec<NodeId> {
        first_nonempty_match(doc, doc.root(), Self::ladder())
    }

    fn scroll_container(&self, doc: &PageDocument) -> ScrollTarget {
        let main = SelectorList::parse("main")
            .ok()
            .and_then(|sel| sel.query(doc, doc.root()));
        if let (Some(main), Ok(scrollers)) = (main, SelectorList::parse(SCROLLER_SELECTOR)) {
            for candidate in scrollers.query_all(doc, main) {
                let scrollable = doc
                    .element(candidate)
                    .and_then(|el| el.scroll)
                    .is_some_and(|m| m.is_scrollable());
                if scrollable {
                    return ScrollTarget::Node(candidate);
                }
            }
        }
        ScrollTarget::Window
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
