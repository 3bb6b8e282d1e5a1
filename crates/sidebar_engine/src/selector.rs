use ego_tree::NodeId;
use thiserror::Error;

use crate::dom::PageDocument;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported selector syntax: {0}")]
    Unsupported(String),
    #[error("malformed attribute matcher: {0}")]
    MalformedAttribute(String),
}

/// A parsed CSS-subset selector list.
///
/// Supported: comma-separated alternatives, the descendant combinator, and
/// compound selectors of tag, `#id`, `.class` and `[attr]`/`[attr=v]`/
/// `[attr^=v]`/`[attr*=v]` with an optional trailing `i` flag for
/// case-insensitive values. That covers the provider selector ladders;
/// anything fancier is a parse error, which callers treat as "matches
/// nothing" rather than a failure.
///
/// Matching follows light-tree semantics: neither matching nor querying
/// crosses a shadow boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    alternatives: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    /// Compounds joined by the descendant combinator, outermost first.
    compounds: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatcher>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatcher {
    name: String,
    op: AttrOp,
    value: Option<String>,
    case_insensitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Prefix,
    Substring,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for part in split_top_level(input, ',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            alternatives.push(parse_complex(part)?);
        }
        if alternatives.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self { alternatives })
    }

    /// Whether `node` matches any alternative.
    pub fn matches(&self, doc: &PageDocument, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|alt| matches_complex(doc, node, alt))
    }

    /// All matching descendant elements of `scope`, in document order.
    pub fn query_all(&self, doc: &PageDocument, scope: NodeId) -> Vec<NodeId> {
        doc.descendant_elements(scope)
            .into_iter()
            .filter(|&id| self.matches(doc, id))
            .collect()
    }

    /// First matching descendant of `scope`, in document order.
    pub fn query(&self, doc: &PageDocument, scope: NodeId) -> Option<NodeId> {
        doc.descendant_elements(scope)
            .into_iter()
            .find(|&id| self.matches(doc, id))
    }

    /// Nearest self-or-ancestor matching the selector, `closest()`-style.
    pub fn closest(&self, doc: &PageDocument, node: NodeId) -> Option<NodeId> {
        if self.matches(doc, node) {
            return Some(node);
        }
        doc.ancestors(node)
            .into_iter()
            .find(|&ancestor| self.matches(doc, ancestor))
    }
}

fn matches_complex(doc: &PageDocument, node: NodeId, selector: &ComplexSelector) -> bool {
    let Some((last, outer)) = selector.compounds.split_last() else {
        return false;
    };
    if !matches_compound(doc, node, last) {
        return false;
    }
    // Each remaining compound must match some strictly higher ancestor,
    // right to left.
    let mut ancestors = doc.ancestors(node).into_iter();
    'outer: for compound in outer.iter().rev() {
        for ancestor in ancestors.by_ref() {
            if matches_compound(doc, ancestor, compound) {
                continue 'outer;
            }
        }
        return false;
    }
    true
}

fn matches_compound(doc: &PageDocument, node: NodeId, compound: &Compound) -> bool {
    let Some(el) = doc.element(node) else {
        return false;
    };
    if el.is_shadow_root {
        return false;
    }
    if let Some(tag) = &compound.tag {
        if !el.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if el.id.as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    if !compound
        .classes
        .iter()
        .all(|class| el.classes.iter().any(|c| c == class))
    {
        return false;
    }
    compound.attrs.iter().all(|matcher| {
        let Some(actual) = el.attrs.get(&matcher.name) else {
            return false;
        };
        let Some(expected) = matcher.value.as_deref() else {
            return matches!(matcher.op, AttrOp::Exists);
        };
        let (actual, expected) = if matcher.case_insensitive {
            (actual.to_lowercase(), expected.to_lowercase())
        } else {
            (actual.clone(), expected.to_string())
        };
        match matcher.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == expected,
            AttrOp::Prefix => actual.starts_with(&expected),
            AttrOp::Substring => actual.contains(&expected),
        }
    })
}

/// Splits on `sep` while ignoring separators inside brackets or quotes.
fn split_top_level(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for ch in input.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
                current.push(ch);
                continue;
            }
            None => {}
        }
        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if c == sep && depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn parse_complex(input: &str) -> Result<ComplexSelector, SelectorError> {
    if input.contains('>') || input.contains('+') || input.contains('~') {
        return Err(SelectorError::Unsupported(input.to_string()));
    }
    let mut compounds = Vec::new();
    for token in split_descendants(input) {
        if token.is_empty() {
            continue;
        }
        compounds.push(parse_compound(&token)?);
    }
    if compounds.is_empty() {
        return Err(SelectorError::Empty);
    }
    Ok(ComplexSelector { compounds })
}

/// Splits a complex selector into compounds on whitespace, ignoring
/// whitespace inside attribute brackets or quotes.
fn split_descendants(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for ch in input.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn parse_compound(input: &str) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();
    let mut chars = input.chars().peekable();

    // Optional leading tag or universal selector.
    if let Some(&first) = chars.peek() {
        if first == '*' {
            chars.next();
        } else if first.is_ascii_alphanumeric() {
            let mut tag = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    tag.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            compound.tag = Some(tag.to_ascii_lowercase());
        }
    }

    while let Some(c) = chars.next() {
        match c {
            '#' | '.' => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '-' || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(SelectorError::Unsupported(input.to_string()));
                }
                if c == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.push(name);
                }
            }
            '[' => {
                let mut inner = String::new();
                let mut quote: Option<char> = None;
                loop {
                    match chars.next() {
                        Some(n) => {
                            if let Some(q) = quote {
                                if n == q {
                                    quote = None;
                                }
                                inner.push(n);
                                continue;
                            }
                            match n {
                                '\'' | '"' => {
                                    quote = Some(n);
                                    inner.push(n);
                                }
                                ']' => break,
                                other => inner.push(other),
                            }
                        }
                        None => {
                            return Err(SelectorError::MalformedAttribute(input.to_string()));
                        }
                    }
                }
                compound.attrs.push(parse_attr(&inner)?);
            }
            ':' => {
                // Pseudo-classes are out of scope; adapters keep a plainer
                // fallback in their ladders for these cases.
                return Err(SelectorError::Unsupported(input.to_string()));
            }
            other => {
                return Err(SelectorError::Unsupported(format!(
                    "{input} (at {other:?})"
                )));
            }
        }
    }
    Ok(compound)
}

fn parse_attr(inner: &str) -> Result<AttrMatcher, SelectorError> {
    let inner = inner.trim();
    let (name_part, rest) = match inner.find('=') {
        Some(idx) => (&inner[..idx], Some(&inner[idx + 1..])),
        None => (inner, None),
    };

    let (name, op) = if let Some(stripped) = name_part.strip_suffix('^') {
        (stripped, AttrOp::Prefix)
    } else if let Some(stripped) = name_part.strip_suffix('*') {
        (stripped, AttrOp::Substring)
    } else if rest.is_some() {
        (name_part, AttrOp::Equals)
    } else {
        (name_part, AttrOp::Exists)
    };
    let name = name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return Err(SelectorError::MalformedAttribute(inner.to_string()));
    }

    let Some(raw_value) = rest else {
        return Ok(AttrMatcher {
            name,
            op,
            value: None,
            case_insensitive: false,
        });
    };

    let mut raw_value = raw_value.trim();
    let mut case_insensitive = false;
    // Trailing ` i` flag outside the quotes.
    if let Some(stripped) = raw_value
        .strip_suffix('i')
        .or_else(|| raw_value.strip_suffix('I'))
    {
        let stripped = stripped.trim_end();
        if stripped.ends_with('"') || stripped.ends_with('\'') {
            case_insensitive = true;
            raw_value = stripped;
        }
    }
    let value = raw_value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| raw_value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(raw_value);

    Ok(AttrMatcher {
        name,
        op,
        value: Some(value.to_string()),
        case_insensitive,
    })
}
