use ego_tree::NodeId;
use sidebar_core::{derive_stable_id, BookmarkSet, EntryGeometry};

use crate::adapter::SiteAdapter;
use crate::dom::PageDocument;
use crate::store::BookmarkStore;

/// One user turn in the timeline.
#[derive(Debug, Clone)]
pub struct TimelineEntry {
    pub node: NodeId,
    pub index: usize,
    pub stable_id: String,
    pub preview: String,
    pub bookmarked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Same turn count and same trailing element; nothing rebuilt.
    Unchanged,
    Rebuilt,
}

/// The ordered index of user turns for the current conversation, plus the
/// bookmark overlay persisted per host.
pub struct TimelineIndex {
    entries: Vec<TimelineEntry>,
    last_nodes: Vec<NodeId>,
    bookmarks: BookmarkSet,
    store: Box<dyn BookmarkStore>,
    host: String,
    preview_max_chars: usize,
    id_fingerprint_chars: usize,
}

impl TimelineIndex {
    /// Loads persisted bookmarks for `host`. A failing store degrades to an
    /// empty set; the session keeps working in memory.
    pub fn new(
        store: Box<dyn BookmarkStore>,
        host: &str,
        preview_max_chars: usize,
        id_fingerprint_chars: usize,
    ) -> Self {
        let bookmarks = match store.load(host) {
            Ok(ids) => BookmarkSet::from_ids(ids),
            Err(err) => {
                engine_logging::engine_warn!("bookmark load failed for {host}: {err}");
                BookmarkSet::default()
            }
        };
        Self {
            entries: Vec::new(),
            last_nodes: Vec::new(),
            bookmarks,
            store,
            host: host.to_string(),
            preview_max_chars,
            id_fingerprint_chars,
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-extracts the turn list and rebuilds the index unless the short
    /// circuit holds: same count and same trailing element as last scan.
    pub fn scan(&mut self, doc: &PageDocument, adapter: &dyn SiteAdapter) -> ScanOutcome {
        let nodes = adapter.user_messages(doc);
        if !nodes.is_empty()
            && nodes.len() == self.last_nodes.len()
            && nodes.last() == self.last_nodes.last()
        {
            return ScanOutcome::Unchanged;
        }

        self.entries = nodes
            .iter()
            .enumerate()
            .map(|(index, &node)| {
                let text = adapter
                    .message_preview(doc, node)
                    .unwrap_or_else(|| doc.text_content(node));
                let dom_id = doc.element(node).and_then(|el| el.id.as_deref());
                let stable_id =
                    derive_stable_id(dom_id, index, &text, self.id_fingerprint_chars);
                let preview = truncate_preview(&text, self.preview_max_chars);
                let bookmarked = self.bookmarks.contains(&stable_id);
                TimelineEntry {
                    node,
                    index,
                    stable_id,
                    preview,
                    bookmarked,
                }
            })
            .collect();
        self.last_nodes = nodes;

        let present: Vec<&str> = self.entries.iter().map(|e| e.stable_id.as_str()).collect();
        if self.bookmarks.observe_scan(present) {
            self.persist();
        }
        engine_logging::engine_debug!(
            "timeline rebuilt: {} turns for {}",
            self.entries.len(),
            self.host
        );
        ScanOutcome::Rebuilt
    }

    /// Flips the bookmark state of a turn. Returns the new state, or `None`
    /// for an id not present in the timeline.
    pub fn toggle_bookmark(&mut self, stable_id: &str) -> Option<bool> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.stable_id == stable_id)?;
        let now_set = self.bookmarks.toggle(stable_id);
        entry.bookmarked = now_set;
        self.persist();
        Some(now_set)
    }

    pub fn is_bookmarked(&self, stable_id: &str) -> bool {
        self.bookmarks.contains(stable_id)
    }

    /// Viewport geometry per entry, in timeline order. Entries without a
    /// layout rect report zero height and are skipped by the active-turn
    /// resolver.
    pub fn geometries(&self, doc: &PageDocument) -> Vec<EntryGeometry> {
        self.entries
            .iter()
            .map(|entry| {
                let rect = doc.element(entry.node).and_then(|el| el.rect);
                match rect {
                    Some(rect) => EntryGeometry {
                        top: rect.top,
                        height: rect.height,
                    },
                    None => EntryGeometry {
                        top: 0.0,
                        height: 0.0,
                    },
                }
            })
            .collect()
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.host, &self.bookmarks.to_vec()) {
            engine_logging::engine_warn!("bookmark save failed for {}: {err}", self.host);
        }
    }
}

fn truncate_preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut out: String = collapsed.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
