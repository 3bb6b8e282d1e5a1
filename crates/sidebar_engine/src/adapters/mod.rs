//! Provider adapters: all per-site selector knowledge lives here.
mod chatgpt;
mod claude;
mod deepseek;
mod gemini;
mod kimi;

pub use chatgpt::ChatGpt;
pub use claude::Claude;
pub use deepseek::DeepSeek;
pub use gemini::Gemini;
pub use kimi::Kimi;

use ego_tree::NodeId;

use crate::dom::PageDocument;
use crate::selector::SelectorList;

pub(crate) fn host_contains(doc: &PageDocument, needle: &str) -> bool {
    doc.location()
        .host_str()
        .is_some_and(|host| host.contains(needle))
}

/// Parses a selector ladder, dropping entries this matcher cannot express.
/// A dropped entry degrades to the next candidate, never to a failure.
pub(crate) fn parse_ladder(raw: &[&str]) -> Vec<SelectorList> {
    raw.iter()
        .filter_map(|sel| match SelectorList::parse(sel) {
            Ok(list) => Some(list),
            Err(err) => {
                engine_logging::engine_debug!("skipping unparsable selector {sel:?}: {err}");
                None
            }
        })
        .collect()
}

/// Walks a ladder in priority order and returns the first selector's
/// non-empty result set.
pub(crate) fn first_nonempty_match(
    doc: &PageDocument,
    scope: NodeId,
    ladder: &[SelectorList],
) -> Vec<NodeId> {
    for list in ladder {
        let hits = list.query_all(doc, scope);
        if !hits.is_empty() {
            return hits;
        }
    }
    Vec::new()
}
