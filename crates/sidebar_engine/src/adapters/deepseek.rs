use std::sync::OnceLock;

use ego_tree::NodeId;

use super::{first_nonempty_match, host_contains, parse_ladder};
use crate::adapter::SiteAdapter;
use crate::dom::{PageDocument, ScrollTarget};
use crate::selector::SelectorList;

// The hashed utility-class selector seen in production markup needs
// `:has()`; the attribute-based ladder below covers the same turns.
const USER_MESSAGE_SELECTORS: &[&str] = &[
    r#"div[class*="ds-message--user"]"#,
    r#"div[class*="user-message"]"#,
    ".message-user",
    r#"div[data-role="user"]"#,
];

const INPUT_SELECTORS: &[&str] = &["textarea", r#"[contenteditable="true"]"#];

pub struct DeepSeek;

impl DeepSeek {
    fn ladder() -> &'static [SelectorList] {
        static LADDER: OnceLock<Vec<SelectorList>> = OnceLock::new();
        LADDER.get_or_init(|| parse_ladder(USER_MESSAGE_SELECTORS))
    }
}

impl SiteAdapter for DeepSeek {
    fn name(&self) -> &'static str {
        "deepseek"
    }

    fn matches(&self, doc: &PageDocument) -> bool {
        host_contains(doc, "deepseek.com")
    }

    fn user_messages(&self, doc: &PageDocument) -> Vec<NodeId> {
        first_nonempty_match(doc, doc.root(), Self::ladder())
    }

    fn scroll_container(&self, _doc: &PageDocument) -> ScrollTarget {
        ScrollTarget::Window
    }

    fn input_selectors(&self) -> &'static [&'static str] {
        INPUT_SELECTORS
    }

    fn input_text(&self, doc: &PageDocument, node: NodeId) -> String {
        match doc.input_value(node) {
            Some(value) if !value.is_empty() => value,
            _ => doc.text_content(node),
        }
    }
}
