use std::collections::{BTreeMap, BTreeSet};

/// The per-origin set of bookmarked turn ids.
///
/// Mutated only by explicit toggles, never auto-pruned except when an id has
/// been missing from two consecutive full rescans. A single miss is
/// forgiven: the owning turn may merely be mid-mutation or virtualized out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSet {
    ids: BTreeSet<String>,
    misses: BTreeMap<String, u32>,
}

impl BookmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            misses: BTreeMap::new(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Toggles a bookmark, returning whether it is now set.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            self.misses.remove(id);
            false
        } else {
            self.ids.insert(id.to_string());
            self.misses.remove(id);
            true
        }
    }

    /// Records which ids a full rescan observed. Returns true when the set
    /// itself changed (an id reached its second consecutive miss and was
    /// dropped), so callers know to re-persist.
    pub fn observe_scan<'a>(&mut self, present: impl IntoIterator<Item = &'a str>) -> bool {
        let present: BTreeSet<&str> = present.into_iter().collect();
        let mut dropped = Vec::new();
        for id in &self.ids {
            if present.contains(id.as_str()) {
                self.misses.remove(id.as_str());
            } else {
                let count = self.misses.entry(id.clone()).or_insert(0);
                *count += 1;
                if *count >= 2 {
                    dropped.push(id.clone());
                }
            }
        }
        for id in &dropped {
            self.ids.remove(id);
            self.misses.remove(id);
        }
        !dropped.is_empty()
    }

    /// Snapshot of the ids for persistence, in sorted order.
    pub fn to_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
