use ego_tree::NodeId;
use sidebar_core::{ends_with_slash_trigger, strip_slash_trigger};

use crate::adapter::SiteAdapter;
use crate::dom::PageDocument;
use crate::selector::SelectorList;

/// Generic editable-surface ladder, used when no provider-specific input
/// selector matches. Value-less `<input>` elements are recognized by the
/// document model itself, so they need no entry here.
const EDITABLE_SELECTORS: &[&str] = &[
    "textarea",
    r#"[contenteditable="true"]"#,
    r#"[contenteditable="plaintext-only"]"#,
    ".ProseMirror",
    "#prompt-textarea",
    r#"input[type="text"]"#,
    r#"input[type="search"]"#,
];

/// Routes host-requested text into the page's composer.
///
/// Tracks the last editable element the user focused so an insertion that
/// arrives after focus moved to browser chrome still lands in the composer.
pub struct InsertionEngine {
    last_focused: Option<NodeId>,
    selectors: Vec<SelectorList>,
}

impl Default for InsertionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsertionEngine {
    pub fn new() -> Self {
        let selectors = EDITABLE_SELECTORS
            .iter()
            .filter_map(|raw| match SelectorList::parse(raw) {
                Ok(sel) => Some(sel),
                Err(err) => {
                    engine_logging::engine_debug!("editable selector skipped: {err}");
                    None
                }
            })
            .collect();
        Self {
            last_focused: None,
            selectors,
        }
    }

    /// Whether a node is an editable surface by any recognized signal.
    pub fn is_editable(&self, doc: &PageDocument, node: NodeId) -> bool {
        let Some(el) = doc.element(node) else {
            return false;
        };
        if el.content_editable || el.is_value_input() {
            return true;
        }
        self.selectors
            .iter()
            .any(|sel| sel.matches(doc, node) || sel.closest(doc, node).is_some())
    }

    /// Records an editable element receiving focus. Focus moving to a
    /// non-editable element does not clear the record; only a later editable
    /// focus replaces it.
    pub fn focus_in(&mut self, doc: &PageDocument, node: NodeId) {
        if self.is_editable(doc, node) {
            self.last_focused = Some(node);
        }
    }

    pub fn last_focused(&self) -> Option<NodeId> {
        self.last_focused
    }

    /// Slash-trigger detection on an input or key event. True when the
    /// surface's text now ends with "whitespace + slash".
    pub fn detect_slash_trigger(
        &self,
        doc: &PageDocument,
        node: NodeId,
        adapter: Option<&dyn SiteAdapter>,
    ) -> bool {
        if !self.is_editable(doc, node) {
            return false;
        }
        let text = surface_text(doc, node, adapter);
        ends_with_slash_trigger(&text)
    }

    /// Inserts `text` into the best editable target, removing a pending
    /// slash trigger first. Returns false only when no target exists.
    pub fn insert_text(
        &mut self,
        doc: &mut PageDocument,
        text: &str,
        adapter: Option<&dyn SiteAdapter>,
    ) -> bool {
        let Some(target) = self.resolve_target(doc) else {
            engine_logging::engine_warn!("text insertion dropped: no editable target");
            return false;
        };
        doc.focus(target);
        self.remove_pending_trigger(doc, target, adapter);

        let inserted = doc.exec_insert_text(target, text)
            || doc.splice_value_at_selection(target, text)
            || doc.append_text(target, text).is_some();
        if inserted {
            doc.dispatch(target, "input");
            doc.dispatch(target, "change");
        } else {
            engine_logging::engine_warn!("all insertion strategies failed");
        }
        true
    }

    /// Drops a pending slash trigger from the composer without inserting
    /// anything. No-op when no target or no trigger is present.
    pub fn clear_slash_trigger(
        &mut self,
        doc: &mut PageDocument,
        adapter: Option<&dyn SiteAdapter>,
    ) {
        if let Some(target) = self.resolve_target(doc) {
            self.remove_pending_trigger(doc, target, adapter);
        }
    }

    /// The currently focused element if editable, else the last editable
    /// element focused, if it is still attached.
    fn resolve_target(&self, doc: &PageDocument) -> Option<NodeId> {
        if let Some(focused) = doc.focused() {
            if self.is_editable(doc, focused) {
                return Some(focused);
            }
        }
        self.last_focused.filter(|&node| doc.contains(node))
    }

    fn remove_pending_trigger(
        &self,
        doc: &mut PageDocument,
        target: NodeId,
        adapter: Option<&dyn SiteAdapter>,
    ) {
        let text = surface_text(doc, target, adapter);
        if !ends_with_slash_trigger(&text) {
            return;
        }
        if doc.input_value(target).is_some() {
            if let Some(stripped) = strip_slash_trigger(&text) {
                doc.set_value(target, &stripped);
                doc.dispatch(target, "input");
            }
        } else {
            doc.trim_trailing_text(target, 2);
        }
    }
}

fn surface_text(doc: &PageDocument, node: NodeId, adapter: Option<&dyn SiteAdapter>) -> String {
    if let Some(adapter) = adapter {
        return adapter.input_text(doc, node);
    }
    match doc.input_value(node) {
        Some(value) => value,
        None => doc.text_content(node),
    }
}

#[cfg(test)]
mod tests {
    use super::InsertionEngine;
    use crate::dom::PageDocument;

    #[test]
    fn editable_recognition_covers_all_signals() {
        let mut doc = PageDocument::new("https://example.com/").unwrap();
        let body = doc.body().unwrap();
        let textarea = doc.append_element(body, "textarea").unwrap();
        let editor = doc.append_element(body, "div").unwrap();
        doc.set_attr(editor, "contenteditable", "true");
        let prose_child = doc.append_element(body, "div").unwrap();
        doc.set_attr(prose_child, "class", "ProseMirror");
        let inner = doc.append_element(prose_child, "p").unwrap();
        let plain = doc.append_element(body, "div").unwrap();

        let engine = InsertionEngine::new();
        assert!(engine.is_editable(&doc, textarea));
        assert!(engine.is_editable(&doc, editor));
        // Descendant of an editor root counts via ancestor matching.
        assert!(engine.is_editable(&doc, inner));
        assert!(!engine.is_editable(&doc, plain));
    }

    #[test]
    fn falls_back_to_last_focused_target() {
        let mut doc = PageDocument::new("https://example.com/").unwrap();
        let body = doc.body().unwrap();
        let textarea = doc.append_element(body, "textarea").unwrap();
        doc.set_value(textarea, "");

        let mut engine = InsertionEngine::new();
        engine.focus_in(&doc, textarea);
        // Focus subsequently moved somewhere non-editable.
        doc.focus(body);

        assert!(engine.insert_text(&mut doc, "hello", None));
        assert_eq!(doc.input_value(textarea).unwrap(), "hello");
    }

    #[test]
    fn strips_slash_trigger_before_inserting() {
        let mut doc = PageDocument::new("https://example.com/").unwrap();
        let body = doc.body().unwrap();
        let textarea = doc.append_element(body, "textarea").unwrap();
        doc.set_value(textarea, "draft /");
        doc.focus(textarea);

        let mut engine = InsertionEngine::new();
        assert!(engine.insert_text(&mut doc, "my prompt", None));
        // The trigger suffix (whitespace and slash) is gone.
        assert_eq!(doc.input_value(textarea).unwrap(), "draftmy prompt");
    }

    #[test]
    fn value_input_falls_back_to_selection_splice() {
        let mut doc = PageDocument::new("https://example.com/").unwrap();
        doc.set_supports_edit_commands(false);
        let body = doc.body().unwrap();
        let textarea = doc.append_element(body, "textarea").unwrap();
        doc.set_value(textarea, "ab");
        doc.set_selection(textarea, 1, 1);
        doc.focus(textarea);

        let mut engine = InsertionEngine::new();
        assert!(engine.insert_text(&mut doc, "X", None));
        // Inserted exactly once, at the selection.
        assert_eq!(doc.input_value(textarea).unwrap(), "aXb");
    }

    #[test]
    fn contenteditable_falls_back_to_append() {
        let mut doc = PageDocument::new("https://example.com/").unwrap();
        doc.set_supports_edit_commands(false);
        let body = doc.body().unwrap();
        let editor = doc.append_element(body, "div").unwrap();
        doc.set_attr(editor, "contenteditable", "true");
        doc.append_text(editor, "draft ");
        doc.focus(editor);

        let mut engine = InsertionEngine::new();
        assert!(engine.insert_text(&mut doc, "text", None));
        assert_eq!(doc.text_content(editor), "draft text");
    }

    #[test]
    fn no_target_reports_failure() {
        let mut doc = PageDocument::new("https://example.com/").unwrap();
        let mut engine = InsertionEngine::new();
        assert!(!engine.insert_text(&mut doc, "hello", None));
        assert!(doc.take_events().is_empty());
    }

    #[test]
    fn events_fire_only_after_a_successful_insertion() {
        let mut doc = PageDocument::new("https://example.com/").unwrap();
        doc.set_supports_edit_commands(false);
        let body = doc.body().unwrap();
        let textarea = doc.append_element(body, "textarea").unwrap();
        doc.set_value(textarea, "");
        doc.focus(textarea);

        let mut engine = InsertionEngine::new();
        assert!(engine.insert_text(&mut doc, "hi", None));
        let names: Vec<_> = doc.take_events().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["input", "change"]);
    }
}
