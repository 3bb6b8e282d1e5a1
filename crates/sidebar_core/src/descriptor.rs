use url::Url;

/// The resolved (URL, title, origin) triple considered authoritative for a
/// page's current state.
///
/// `href` is always an absolute URL. For providers with client-side routing
/// it reflects the current conversation derived from navigational anchors,
/// not merely the address bar, which may lag behind a client-rendered route
/// change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDescriptor {
    pub href: String,
    pub title: String,
    pub origin: String,
}

/// Resolves a possibly relative href against the page location, returning an
/// absolute URL string. Unparseable or empty input yields `None`.
pub fn absolutize_href(raw: &str, base: &Url) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.into());
    }
    base.join(trimmed).ok().map(Into::into)
}

/// The `scheme://host[:port]` origin of a URL, matching what the page itself
/// would report.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[cfg(test)]
mod tests {
    use super::{absolutize_href, origin_of};
    use url::Url;

    #[test]
    fn relative_href_joins_against_base() {
        let base = Url::parse("https://gemini.google.com/app/abc").unwrap();
        assert_eq!(
            absolutize_href("/app/def", &base).as_deref(),
            Some("https://gemini.google.com/app/def")
        );
    }

    #[test]
    fn absolute_href_passes_through() {
        let base = Url::parse("https://chatgpt.com/").unwrap();
        assert_eq!(
            absolutize_href("https://chatgpt.com/c/123", &base).as_deref(),
            Some("https://chatgpt.com/c/123")
        );
    }

    #[test]
    fn empty_href_is_rejected() {
        let base = Url::parse("https://chatgpt.com/").unwrap();
        assert_eq!(absolutize_href("   ", &base), None);
    }

    #[test]
    fn origin_drops_path_and_query() {
        let url = Url::parse("https://claude.ai/chat/xyz?x=1").unwrap();
        assert_eq!(origin_of(&url), "https://claude.ai");
    }
}
