use std::collections::BTreeMap;

use ego_tree::iter::Children;
use ego_tree::{NodeId, NodeRef, Tree};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Viewport-relative layout rectangle, as the page would report it for a
/// rendered element. Detached or virtualized elements have no rect.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }
}

/// Scroll metrics of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub client_height: f64,
    pub scroll_top: f64,
}

impl ScrollMetrics {
    /// True when the element actually has overflowing content.
    pub fn is_scrollable(&self) -> bool {
        self.scroll_height > self.client_height
    }
}

/// The element whose scroll position governs timeline geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Window,
    Node(NodeId),
}

/// A synthetic DOM event dispatched by the engine, recorded so reactive
/// hosts observing the surface can recompute their own state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticEvent {
    pub node: NodeId,
    pub name: &'static str,
}

/// One node of the page tree: an element or a run of text.
#[derive(Debug, Clone)]
pub enum PageNode {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct ElementData {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    /// Current value of a value-based input. Char-indexed selection range.
    pub value: Option<String>,
    pub selection: Option<(usize, usize)>,
    pub content_editable: bool,
    /// Marks the synthetic root node of a shadow tree.
    pub is_shadow_root: bool,
    pub rect: Option<Rect>,
    pub scroll: Option<ScrollMetrics>,
    pub overflow_y: Option<String>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// True for surfaces whose text lives in `value` rather than in child
    /// text nodes: textareas and text-like inputs (including inputs with no
    /// `type` attribute, which default to text).
    pub fn is_value_input(&self) -> bool {
        match self.tag.as_str() {
            "textarea" => true,
            "input" => matches!(
                self.attrs.get("type").map(String::as_str),
                None | Some("") | Some("text") | Some("search")
            ),
            _ => false,
        }
    }

    fn sync_from_attrs(&mut self) {
        self.id = self.attrs.get("id").cloned();
        self.classes = self
            .attrs
            .get("class")
            .map(|c| c.split_whitespace().map(ToOwned::to_owned).collect())
            .unwrap_or_default();
        self.content_editable = matches!(
            self.attrs.get("contenteditable").map(String::as_str),
            Some("true") | Some("plaintext-only") | Some("")
        );
        if let Some(value) = self.attrs.get("value") {
            self.value = Some(value.clone());
        }
    }
}

/// A read-only view of one node, handed to search predicates and heuristics.
#[derive(Clone, Copy)]
pub struct NodeHandle<'a> {
    doc: &'a PageDocument,
    id: NodeId,
}

impl<'a> NodeHandle<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn element(&self) -> Option<&'a ElementData> {
        self.doc.element(self.id)
    }

    pub fn tag(&self) -> Option<&'a str> {
        self.element().map(|el| el.tag.as_str())
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element()
            .and_then(|el| el.attrs.get(name))
            .map(String::as_str)
    }

    pub fn text(&self) -> String {
        self.doc.text_content(self.id)
    }
}

/// A live, mutable model of the page the engine runs against.
///
/// The tree is owned by the host page, not by us: hosts apply mutations and
/// layout updates here and feed the corresponding events into the engine.
/// [`NodeId`] is the stable reference identity; it survives unrelated
/// mutations and changes when a node is replaced.
pub struct PageDocument {
    tree: Tree<PageNode>,
    location: Url,
    title: String,
    focused: Option<NodeId>,
    supports_edit_commands: bool,
    viewport_height: f64,
    scrolling_element: Option<NodeId>,
    events: Vec<SyntheticEvent>,
}

impl PageDocument {
    /// An empty document (`<html><body/></html>`) at the given location.
    pub fn new(location: &str) -> Result<Self, DomError> {
        let location = Url::parse(location)?;
        let mut tree = Tree::new(PageNode::Element(ElementData::new("html")));
        tree.root_mut().append(PageNode::Element(ElementData::new("body")));
        Ok(Self {
            tree,
            location,
            title: String::new(),
            focused: None,
            supports_edit_commands: true,
            viewport_height: 800.0,
            scrolling_element: None,
            events: Vec::new(),
        })
    }

    /// Builds a document from an HTML fixture. Layout rects, scroll metrics
    /// and focus state are not part of HTML; hosts populate them afterwards.
    pub fn parse(html: &str, location: &str) -> Result<Self, DomError> {
        let mut doc = Self::new(location)?;
        let parsed = scraper::Html::parse_document(html);
        let root_id = doc.root();

        // Replace the default skeleton with the parsed one.
        let child_ids: Vec<NodeId> = doc
            .tree
            .get(root_id)
            .map(|root| root.children().map(|c| c.id()).collect())
            .unwrap_or_default();
        for id in child_ids {
            if let Some(mut node) = doc.tree.get_mut(id) {
                node.detach();
            }
        }
        for child in parsed.root_element().children() {
            doc.append_converted(root_id, child);
        }
        if let Some(title_node) = doc.find_tag(root_id, "title") {
            doc.title = doc.text_content(title_node).trim().to_string();
        }
        Ok(doc)
    }

    fn append_converted(&mut self, parent: NodeId, node: ego_tree::NodeRef<'_, scraper::Node>) {
        match node.value() {
            scraper::Node::Element(element) => {
                let mut data = ElementData::new(element.name());
                for (name, value) in element.attrs() {
                    data.attrs.insert(name.to_string(), value.to_string());
                }
                data.sync_from_attrs();
                let Some(id) = self.append(parent, PageNode::Element(data)) else {
                    return;
                };
                for child in node.children() {
                    self.append_converted(id, child);
                }
            }
            scraper::Node::Text(text) => {
                if !text.is_empty() {
                    self.append(parent, PageNode::Text(text.to_string()));
                }
            }
            _ => {}
        }
    }

    fn append(&mut self, parent: NodeId, value: PageNode) -> Option<NodeId> {
        Some(self.tree.get_mut(parent)?.append(value).id())
    }

    // ---- page-level state ----

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn origin(&self) -> String {
        sidebar_core::origin_of(&self.location)
    }

    /// Replaces the location, as a history push/replace or popstate would.
    pub fn navigate(&mut self, href: &str) -> Result<(), DomError> {
        self.location = match Url::parse(href) {
            Ok(url) => url,
            Err(_) => self.location.join(href)?,
        };
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn focus(&mut self, id: NodeId) {
        if self.tree.get(id).is_some() {
            self.focused = Some(id);
        }
    }

    pub fn supports_edit_commands(&self) -> bool {
        self.supports_edit_commands
    }

    /// Whether the page honors a native "insert text at cursor" editing
    /// command. Some embedders refuse it, which exercises the fallback chain.
    pub fn set_supports_edit_commands(&mut self, supported: bool) {
        self.supports_edit_commands = supported;
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height;
    }

    pub fn scrolling_element(&self) -> Option<NodeId> {
        self.scrolling_element
    }

    pub fn set_scrolling_element(&mut self, id: NodeId) {
        self.scrolling_element = Some(id);
    }

    pub fn take_events(&mut self) -> Vec<SyntheticEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn dispatch(&mut self, node: NodeId, name: &'static str) {
        self.events.push(SyntheticEvent { node, name });
    }

    // ---- tree access ----

    pub fn root(&self) -> NodeId {
        self.tree.root().id()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_tag(self.root(), "body")
    }

    pub fn handle(&self, id: NodeId) -> NodeHandle<'_> {
        NodeHandle { doc: self, id }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.tree.get(id).is_some()
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.tree.get(id)?.value() {
            PageNode::Element(data) => Some(data),
            PageNode::Text(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|p| p.id())
    }

    /// The parent element within the same tree scope: stops at a shadow
    /// boundary, matching what selector matching may cross.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        match self.element(parent) {
            Some(el) if !el.is_shadow_root => Some(parent),
            _ => None,
        }
    }

    /// Ancestor elements from the closest upward, not crossing shadow
    /// boundaries.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent_element(current) {
            out.push(parent);
            current = parent;
        }
        out
    }

    /// Element children in the light tree (shadow roots excluded).
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.filter_children(id, false)
    }

    /// Element children including attached shadow roots, as a piercing
    /// traversal sees them.
    pub fn child_elements_piercing(&self, id: NodeId) -> Vec<NodeId> {
        self.filter_children(id, true)
    }

    fn filter_children(&self, id: NodeId, pierce: bool) -> Vec<NodeId> {
        let Some(node) = self.tree.get(id) else {
            return Vec::new();
        };
        element_children(node.children(), pierce)
    }

    /// Descendant elements of `scope` in document order, light tree only.
    /// The scope itself is excluded, matching `querySelectorAll` semantics.
    pub fn descendant_elements(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_elements(scope);
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.child_elements(id);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Concatenated text of the node and its light-tree descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.tree.get(id) {
            collect_text(node, &mut out);
        }
        out
    }

    /// The `value` of a value-based input, if this is one.
    pub fn input_value(&self, id: NodeId) -> Option<String> {
        let el = self.element(id)?;
        if el.is_value_input() {
            Some(el.value.clone().unwrap_or_default())
        } else {
            None
        }
    }

    // ---- mutation (host side) ----

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.append(parent, PageNode::Element(ElementData::new(tag)))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Option<NodeId> {
        self.append(parent, PageNode::Text(text.to_string()))
    }

    /// Attaches a shadow root to `host`, returning the shadow tree's root.
    pub fn attach_shadow(&mut self, host: NodeId) -> Option<NodeId> {
        let mut data = ElementData::new("#shadow-root");
        data.is_shadow_root = true;
        self.append(host, PageNode::Element(data))
    }

    pub fn remove_node(&mut self, id: NodeId) {
        if let Some(mut node) = self.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Replaces an element's children with a single text node, or rewrites a
    /// text node in place.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let is_text = matches!(self.tree.get(id).map(|n| n.value()), Some(PageNode::Text(_)));
        if is_text {
            if let Some(mut node) = self.tree.get_mut(id) {
                *node.value() = PageNode::Text(text.to_string());
            }
            return;
        }
        let child_ids: Vec<NodeId> = self
            .tree
            .get(id)
            .map(|node| node.children().map(|c| c.id()).collect())
            .unwrap_or_default();
        for child in child_ids {
            self.remove_node(child);
        }
        self.append_text(id, text);
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.with_element(id, |el| {
            el.attrs.insert(name.to_string(), value.to_string());
            el.sync_from_attrs();
        });
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        self.with_element(id, |el| {
            if !el.classes.iter().any(|c| c == class) {
                el.classes.push(class.to_string());
                let joined = el.classes.join(" ");
                el.attrs.insert("class".to_string(), joined);
            }
        });
    }

    pub fn set_element_id(&mut self, id: NodeId, dom_id: &str) {
        self.set_attr(id, "id", dom_id);
    }

    pub fn set_content_editable(&mut self, id: NodeId, editable: bool) {
        self.with_element(id, |el| el.content_editable = editable);
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        let chars = value.chars().count();
        self.with_element(id, |el| {
            el.value = Some(value.to_string());
            el.selection = Some((chars, chars));
        });
    }

    /// Sets the selection range of a value-based input, in char offsets.
    pub fn set_selection(&mut self, id: NodeId, start: usize, end: usize) {
        self.with_element(id, |el| el.selection = Some((start, end)));
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        self.with_element(id, |el| el.rect = Some(rect));
    }

    pub fn set_scroll_metrics(&mut self, id: NodeId, metrics: ScrollMetrics) {
        self.with_element(id, |el| el.scroll = Some(metrics));
    }

    pub fn set_overflow_y(&mut self, id: NodeId, overflow: &str) {
        self.with_element(id, |el| el.overflow_y = Some(overflow.to_string()));
    }

    fn with_element(&mut self, id: NodeId, f: impl FnOnce(&mut ElementData)) {
        if let Some(mut node) = self.tree.get_mut(id) {
            if let PageNode::Element(el) = node.value() {
                f(el);
            }
        }
    }

    // ---- editing primitives used by the insertion engine ----

    /// The native "insert text at cursor" editing command. Fails when the
    /// embedder does not honor it or the node is not an editable surface.
    pub fn exec_insert_text(&mut self, id: NodeId, text: &str) -> bool {
        if !self.supports_edit_commands {
            return false;
        }
        let Some(el) = self.element(id) else {
            return false;
        };
        if el.is_value_input() {
            self.splice_value_at_selection(id, text)
        } else if el.content_editable {
            self.append_text(id, text).is_some()
        } else {
            false
        }
    }

    /// Splices text into a value-based input at its current selection and
    /// collapses the selection after the inserted text.
    pub fn splice_value_at_selection(&mut self, id: NodeId, text: &str) -> bool {
        let mut done = false;
        self.with_element(id, |el| {
            if !el.is_value_input() {
                return;
            }
            let value = el.value.take().unwrap_or_default();
            let chars: Vec<char> = value.chars().collect();
            let (start, end) = el.selection.unwrap_or((chars.len(), chars.len()));
            let start = start.min(chars.len());
            let end = end.clamp(start, chars.len());
            let mut next: String = chars[..start].iter().collect();
            next.push_str(text);
            next.extend(&chars[end..]);
            el.value = Some(next);
            let caret = start + text.chars().count();
            el.selection = Some((caret, caret));
            done = true;
        });
        done
    }

    /// Removes the last `n_chars` characters of an element's light-tree
    /// text, possibly across several trailing text nodes. Returns whether
    /// all requested characters were removed.
    pub fn trim_trailing_text(&mut self, id: NodeId, n_chars: usize) -> bool {
        let mut text_nodes = Vec::new();
        if let Some(node) = self.tree.get(id) {
            collect_text_nodes(node, &mut text_nodes);
        }
        let mut remaining = n_chars;
        for text_id in text_nodes.into_iter().rev() {
            if remaining == 0 {
                break;
            }
            if let Some(mut node) = self.tree.get_mut(text_id) {
                if let PageNode::Text(text) = node.value() {
                    while remaining > 0 && text.pop().is_some() {
                        remaining -= 1;
                    }
                }
            }
        }
        remaining == 0
    }

    fn find_tag(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendant_elements(scope)
            .into_iter()
            .find(|&id| self.element(id).is_some_and(|el| el.tag == tag))
    }
}

fn element_children(children: Children<'_, PageNode>, pierce: bool) -> Vec<NodeId> {
    children
        .filter(|child| match child.value() {
            PageNode::Element(el) => pierce || !el.is_shadow_root,
            PageNode::Text(_) => false,
        })
        .map(|child| child.id())
        .collect()
}

fn collect_text(node: NodeRef<'_, PageNode>, out: &mut String) {
    if let PageNode::Text(text) = node.value() {
        out.push_str(text);
        return;
    }
    for child in node.children() {
        if let PageNode::Element(el) = child.value() {
            if el.is_shadow_root {
                continue;
            }
        }
        collect_text(child, out);
    }
}

fn collect_text_nodes(node: NodeRef<'_, PageNode>, out: &mut Vec<NodeId>) {
    if let PageNode::Text(_) = node.value() {
        out.push(node.id());
        return;
    }
    for child in node.children() {
        if let PageNode::Element(el) = child.value() {
            if el.is_shadow_root {
                continue;
            }
        }
        collect_text_nodes(child, out);
    }
}
