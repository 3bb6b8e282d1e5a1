/// Placeholder strings that providers show before a conversation has a real
/// title, lowercased. Localized equivalents belong here too.
const TRIVIAL_TITLES: &[&str] = &[
    "recent",
    "gemini",
    "google gemini",
    "conversation with gemini",
    "new chat",
    "start a new chat",
    // zh placeholders.
    "聊天",
    "新聊天",
    "对话",
    "新对话",
    "最近",
];

/// Returns true when a title candidate is a meaningless default rather than
/// a real conversation title. Matching is case-insensitive and ignores
/// surrounding whitespace; an empty candidate is trivial.
pub fn is_trivial_title(candidate: &str) -> bool {
    let normalized = candidate.trim().to_lowercase();
    normalized.is_empty() || TRIVIAL_TITLES.contains(&normalized.as_str())
}

/// Screens a candidate, keeping it trimmed and only when non-trivial.
pub fn non_trivial(candidate: Option<String>) -> Option<String> {
    candidate
        .map(|title| title.trim().to_string())
        .filter(|title| !is_trivial_title(title))
}
