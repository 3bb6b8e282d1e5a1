use std::time::Duration;

use crate::search::SearchBudget;

/// Tunable behavior of the engine. The defaults are the production values;
/// tests shrink the debounce windows to keep themselves fast.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Quiet window before an identity change is reported.
    pub notify_debounce: Duration,
    /// Quiet window after DOM mutations before the timeline is rescanned.
    pub scan_debounce: Duration,
    pub search_budget: SearchBudget,
    /// Max chars of a turn preview before truncation.
    pub preview_max_chars: usize,
    /// Chars of normalized leading text folded into a derived turn id.
    pub id_fingerprint_chars: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            notify_debounce: Duration::from_millis(100),
            scan_debounce: Duration::from_millis(500),
            search_budget: SearchBudget::default(),
            preview_max_chars: 100,
            id_fingerprint_chars: 20,
        }
    }
}
