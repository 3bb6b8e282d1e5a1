/// True when the text ends with the two-character picker trigger: one
/// whitespace character followed by a slash. Repeated keystrokes do not
/// re-trigger until the literal suffix forms.
pub fn ends_with_slash_trigger(text: &str) -> bool {
    let mut chars = text.chars().rev();
    chars.next() == Some('/') && chars.next().is_some_and(char::is_whitespace)
}

/// Strips a trailing "whitespace + slash" trigger, returning the shortened
/// text. Returns `None` when no trigger is present.
pub fn strip_slash_trigger(text: &str) -> Option<String> {
    if !ends_with_slash_trigger(text) {
        return None;
    }
    let mut chars = text.chars();
    chars.next_back();
    chars.next_back();
    Some(chars.as_str().to_string())
}
