use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ego_tree::NodeId;

use crate::dom::{NodeHandle, PageDocument};

/// Budget for one bounded traversal.
///
/// Both limits are deliberate precision/latency trade-offs: on highly
/// dynamic pages an unbounded traversal could run indefinitely or re-enter
/// during rapid mutation bursts, so the search favors bounded latency over
/// completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    pub max_nodes: usize,
    pub max_elapsed: Duration,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_nodes: 500,
            max_elapsed: Duration::from_millis(10),
        }
    }
}

/// Budgeted breadth-first search over the page tree, descending into both
/// regular children and shadow roots.
///
/// Returns the first element for which `predicate` holds, or `None` once
/// either budget is exhausted, even if matching nodes remain. Fallible
/// heuristics inside the predicate should resolve to `false` for that node;
/// a non-match never aborts the traversal. No side effects; safe to call
/// frequently.
pub fn search(
    doc: &PageDocument,
    root: NodeId,
    predicate: impl Fn(NodeHandle<'_>) -> bool,
    budget: &SearchBudget,
) -> Option<NodeId> {
    let started = Instant::now();
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    queue.push_back(root);
    let mut seen = 0usize;

    while let Some(id) = queue.pop_front() {
        if seen >= budget.max_nodes || started.elapsed() > budget.max_elapsed {
            return None;
        }
        seen += 1;
        if predicate(doc.handle(id)) {
            return Some(id);
        }
        for child in doc.child_elements_piercing(id) {
            queue.push_back(child);
        }
    }
    None
}
