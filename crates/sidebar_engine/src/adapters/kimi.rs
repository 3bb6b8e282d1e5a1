use std::sync::OnceLock;

use ego_tree::NodeId;

use super::{first_nonempty_match, host_contains, parse_ladder};
use crate::adapter::SiteAdapter;
use crate::dom::{PageDocument, ScrollTarget};
use crate::selector::SelectorList;

const USER_MESSAGE_SELECTORS: &[&str] = &[
    r#"div[class*="user-message"]"#,
    r#"div[class*="UserMessage"]"#,
    ".chat-message-user",
];

const INPUT_SELECTORS: &[&str] = &["textarea", r#"[contenteditable="true"]"#];

pub struct Kimi;

impl Kimi {
    fn ladder() -> &'static [SelectorList] {
        static LADDER: OnceLock<Vec<SelectorList>> = OnceLock::new();
        LADDER.get_or_init(|| parse_ladder(USER_MESSAGE_SELECTORS))
    }
}

impl SiteAdapter for Kimi {
    fn name(&self) -> &'static str {
        "kimi"
    }

    fn matches(&self, doc: &PageDocument) -> bool {
        host_contains(doc, "kimi.moonshot.cn")
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
