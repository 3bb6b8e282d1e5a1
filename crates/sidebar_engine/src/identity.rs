use sidebar_core::{absolutize_href, non_trivial, CanonicalDescriptor};

use crate::dom::{NodeHandle, PageDocument};
use crate::search::{search, SearchBudget};
use crate::selector::SelectorList;

const GEMINI_ORIGIN: &str = "https://gemini.google.com";
const GEMINI_APP_PREFIX: &str = "https://gemini.google.com/app/";

/// Containers that mark the selected conversation in the sidebar.
const ACTIVE_CONTAINER_SELECTOR: &str = r#"[aria-selected="true"], [aria-current="page"], [data-active="true"], [data-selected="true"], [class*="active"], [class*="selected"]"#;

/// Resolves the canonical (URL, title, origin) triple for the page.
///
/// Never fails: every heuristic degrades to the next candidate, and the
/// final fallbacks are the address bar and the document title.
pub fn resolve_canonical(doc: &PageDocument, budget: &SearchBudget) -> CanonicalDescriptor {
    let href = gemini_canonical_href(doc, budget)
        .unwrap_or_else(|| doc.location().as_str().to_string());
    let title = gemini_title(doc, budget)
        .or_else(|| chatgpt_title(doc))
        .unwrap_or_else(|| doc.title().to_string());
    CanonicalDescriptor {
        href,
        title,
        origin: doc.origin(),
    }
}

/// A conversation-scoped href for Gemini, preferred over the address bar
/// because the client-side router updates the visible address lazily.
pub fn gemini_canonical_href(doc: &PageDocument, budget: &SearchBudget) -> Option<String> {
    if doc.origin() != GEMINI_ORIGIN {
        return None;
    }
    let is_conversation_anchor = |node: NodeHandle<'_>| {
        if node.tag() != Some("a") {
            return false;
        }
        match node.attr("href").and_then(|h| absolutize_href(h, doc.location())) {
            Some(abs) => abs.starts_with(GEMINI_APP_PREFIX) && abs.len() > GEMINI_APP_PREFIX.len(),
            None => false,
        }
    };
    if let Some(anchor) = search(doc, doc.root(), is_conversation_anchor, budget) {
        let href = doc
            .handle(anchor)
            .attr("href")
            .and_then(|h| absolutize_href(h, doc.location()));
        if let Some(href) = href {
            return Some(href);
        }
    }
    // Share widgets carry the conversation URL as data attributes.
    let share = search(
        doc,
        doc.root(),
        |node| {
            node.attr("data-clipboard-text").is_some() || node.attr("data-share-url").is_some()
        },
        budget,
    )?;
    let handle = doc.handle(share);
    let value = handle
        .attr("data-clipboard-text")
        .or_else(|| handle.attr("data-share-url"))?;
    if value.starts_with(GEMINI_APP_PREFIX) {
        Some(value.to_string())
    } else {
        None
    }
}

/// Extracts the conversation id from a Gemini `/app/...` URL.
pub fn gemini_conversation_id(href: &str) -> Option<String> {
    let url = url::Url::parse(href).ok()?;
    let mut segments = url.path_segments()?;
    if segments.next() != Some("app") {
        return None;
    }
    let candidate = match segments.next()? {
        "conversation" => segments.next()?,
        other => other,
    };
    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}

fn gemini_title(doc: &PageDocument, budget: &SearchBudget) -> Option<String> {
    if doc.origin() != GEMINI_ORIGIN {
        return None;
    }
    let canonical =
        gemini_canonical_href(doc, budget).unwrap_or_else(|| doc.location().as_str().to_string());

    // (a) the sidebar link for the current conversation id.
    if let Some(conv_id) = gemini_conversation_id(&canonical) {
        let needle = format!("/app/{conv_id}");
        let link = search(
            doc,
            doc.root(),
            |node| {
                node.tag() == Some("a") && node.attr("href").is_some_and(|h| h.contains(&needle))
            },
            budget,
        );
        if let Some(link) = link {
            if let Some(title) = non_trivial(Some(doc.text_content(link))) {
                return Some(title);
            }
        }
    }

    // (b) a conversation-title element inside a navigation landmark,
    // restricted to the selected/active container.
    let nav_scope = search(
        doc,
        doc.root(),
        |node| {
            matches!(node.tag(), Some("nav") | Some("aside"))
                || node.attr("role") == Some("navigation")
        },
        budget,
    );
    if let Some(scope) = nav_scope {
        let active = SelectorList::parse(ACTIVE_CONTAINER_SELECTOR).ok();
        let active_title = search(
            doc,
            scope,
            |node| {
                has_conversation_title_class(node)
                    && !node.text().trim().is_empty()
                    && active
                        .as_ref()
                        .is_some_and(|sel| sel.closest(doc, node.id()).is_some())
            },
            budget,
        );
        if let Some(node) = active_title {
            if let Some(title) = non_trivial(Some(doc.text_content(node))) {
                return Some(title);
            }
        }
    }

    // (c) any globally unique conversation-title element.
    let global = search(
        doc,
        doc.root(),
        |node| has_conversation_title_class(node) && !node.text().trim().is_empty(),
        budget,
    )?;
    non_trivial(Some(doc.text_content(global)))
}

fn has_conversation_title_class(node: NodeHandle<'_>) -> bool {
    node.element().is_some_and(|el| {
        el.classes
            .iter()
            .any(|class| class.to_lowercase().contains("conversation-title"))
    })
}

fn chatgpt_title(doc: &PageDocument) -> Option<String> {
    if !doc
        .location()
        .host_str()
        .is_some_and(|host| host.contains("chatgpt.com"))
    {
        return None;
    }
    let h1 = SelectorList::parse("h1").ok()?.query(doc, doc.root())?;
    non_trivial(Some(doc.text_content(h1)))
}
