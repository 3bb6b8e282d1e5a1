use ego_tree::NodeId;

use crate::adapters::{ChatGpt, Claude, DeepSeek, Gemini, Kimi};
use crate::dom::{PageDocument, ScrollTarget};

/// Capability record for one provider.
///
/// Adapters encapsulate all provider-specific selector knowledge behind
/// this interface, so one provider's markup change cannot break another's
/// logic. The engine and its algorithms are provider-agnostic; new
/// providers are added purely by appending an adapter to the table.
pub trait SiteAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this adapter applies to the current page.
    fn matches(&self, doc: &PageDocument) -> bool;

    /// Current, render-order list of user turn elements. Recomputed on
    /// demand, never cached by the adapter.
    fn user_messages(&self, doc: &PageDocument) -> Vec<NodeId>;

    /// The element whose scroll position governs timeline geometry.
    fn scroll_container(&self, doc: &PageDocument) -> ScrollTarget;

    /// Best-effort short text extraction for a turn. Optional capability;
    /// callers fall back to generic text extraction.
    fn message_preview(&self, _doc: &PageDocument, _node: NodeId) -> Option<String> {
        None
    }

    /// Selector ladder for this provider's editable composer surface.
    fn input_selectors(&self) -> &'static [&'static str];

    /// Text of an editable surface, the way this provider exposes it.
    fn input_text(&self, doc: &PageDocument, node: NodeId) -> String;
}

/// Fixed priority order; the first match wins. At most one adapter matches
/// a given origin, so resolution is deterministic.
static ADAPTERS: [&'static dyn SiteAdapter; 5] = [&ChatGpt, &Gemini, &DeepSeek, &Claude, &Kimi];

/// Selects the adapter for the current page, if any. With no match the
/// timeline features are disabled while identity and insertion keep
/// working.
pub fn resolve_adapter(doc: &PageDocument) -> Option<&'static dyn SiteAdapter> {
    let adapter = ADAPTERS.iter().copied().find(|a| a.matches(doc));
    match adapter {
        Some(adapter) => {
            engine_logging::engine_debug!("adapter matched: {}", adapter.name());
        }
        None => {
            engine_logging::engine_debug!(
                "no adapter for {}; timeline disabled",
                doc.origin()
            );
        }
    }
    adapter
}
