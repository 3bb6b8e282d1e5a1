/// Derives a reproducible identifier for a conversation turn.
///
/// A node that carries its own DOM id keeps it. Otherwise the id combines
/// the render position with a truncated, whitespace-stripped text
/// fingerprint, so it survives re-renders that replace the node but keep
/// content and order. This id is the persistence key for bookmarks.
pub fn derive_stable_id(
    dom_id: Option<&str>,
    index: usize,
    text: &str,
    fingerprint_chars: usize,
) -> String {
    if let Some(id) = dom_id {
        if !id.is_empty() {
            return id.to_string();
        }
    }
    let fingerprint: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(fingerprint_chars)
        .collect();
    format!("msg_{index}_{fingerprint}")
}
