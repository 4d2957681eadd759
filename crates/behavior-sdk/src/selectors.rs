//! Click target matching — a small selector grammar covering the configured
//! allowlist forms (`a`, `button`, `input[type="submit"]`, `.trackable`,
//! `#id`) with closest-match semantics over the target's ancestor chain.

use std::collections::HashMap;

use thiserror::Error;

/// A DOM element flattened into data at the host boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomNode {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub href: Option<String>,
}

impl DomNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Space-joined class attribute, as `element.className` reports it.
    pub fn class_attr(&self) -> String {
        self.classes.join(" ")
    }
}

/// A click target with its ancestor chain, nearest ancestor first.
#[derive(Debug, Clone, Default)]
pub struct ClickTarget {
    pub node: DomNode,
    pub ancestors: Vec<DomNode>,
}

impl ClickTarget {
    pub fn new(node: DomNode) -> Self {
        Self {
            node,
            ancestors: Vec::new(),
        }
    }

    pub fn with_ancestors(mut self, ancestors: Vec<DomNode>) -> Self {
        self.ancestors = ancestors;
        self
    }

    /// The target followed by its ancestors, outward.
    pub fn chain(&self) -> impl Iterator<Item = &DomNode> {
        std::iter::once(&self.node).chain(self.ancestors.iter())
    }

    /// Nearest node in the chain (including the target) matching the
    /// predicate — `element.closest` semantics.
    pub fn closest(&self, pred: impl Fn(&DomNode) -> bool) -> Option<&DomNode> {
        self.chain().find(|node| pred(node))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported selector: {0}")]
    Unsupported(String),
}

/// Parsed form of a configured selector string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Tag(String),
    Class(String),
    Id(String),
    TagAttr {
        tag: String,
        attr: String,
        value: String,
    },
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SelectorError::Empty);
        }

        if let Some(class) = raw.strip_prefix('.') {
            if !class.is_empty() && is_identifier(class) {
                return Ok(Selector::Class(class.to_string()));
            }
            return Err(SelectorError::Unsupported(raw.to_string()));
        }

        if let Some(id) = raw.strip_prefix('#') {
            if !id.is_empty() && is_identifier(id) {
                return Ok(Selector::Id(id.to_string()));
            }
            return Err(SelectorError::Unsupported(raw.to_string()));
        }

        if let Some(open) = raw.find('[') {
            let (tag, rest) = raw.split_at(open);
            let inner = rest
                .strip_prefix('[')
                .and_then(|r| r.strip_suffix(']'))
                .ok_or_else(|| SelectorError::Unsupported(raw.to_string()))?;
            let (attr, value) = inner
                .split_once('=')
                .ok_or_else(|| SelectorError::Unsupported(raw.to_string()))?;
            let value = value
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            if tag.is_empty() || !is_identifier(tag) || !is_identifier(attr.trim()) {
                return Err(SelectorError::Unsupported(raw.to_string()));
            }
            return Ok(Selector::TagAttr {
                tag: tag.to_ascii_lowercase(),
                attr: attr.trim().to_ascii_lowercase(),
                value,
            });
        }

        if is_identifier(raw) {
            return Ok(Selector::Tag(raw.to_ascii_lowercase()));
        }
        Err(SelectorError::Unsupported(raw.to_string()))
    }

    pub fn matches(&self, node: &DomNode) -> bool {
        match self {
            Selector::Tag(tag) => node.tag == *tag,
            Selector::Class(class) => node.classes.iter().any(|c| c == class),
            Selector::Id(id) => node.id.as_deref() == Some(id.as_str()),
            Selector::TagAttr { tag, attr, value } => {
                node.tag == *tag && node.attributes.get(attr).map(String::as_str) == Some(value)
            }
        }
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Whether a click on `target` should be tracked under the configured
/// allowlist. An empty list tracks everything; a selector that fails to
/// parse counts as non-matching for that selector only.
pub fn should_track(target: &ClickTarget, selectors: &[String]) -> bool {
    if selectors.is_empty() {
        return true;
    }
    selectors.iter().any(|raw| match Selector::parse(raw) {
        Ok(selector) => target.chain().any(|node| selector.matches(node)),
        Err(_) => false,
    })
}
