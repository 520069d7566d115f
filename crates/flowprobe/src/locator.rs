//! Field references and locator strategies.
//!
//! A [`FieldRef`] names a field by intent ("mobile number") and lists the
//! strategies that may find it, in priority order. Strategies are plain data:
//! they match against a [`DomSnapshot`] and render a CSS-like description so
//! every resolution can be logged with the exact list that was tried.
//!
//! ```
//! use flowprobe::{FieldRef, Strategy};
//!
//! let mobile = FieldRef::new("mobile number")
//!     .or(Strategy::attr_icontains("name", "mobile").tagged("input"))
//!     .or(Strategy::attr_icontains("placeholder", "phone").tagged("input"));
//!
//! assert_eq!(
//!     mobile.describe(),
//!     r#"input[name*="mobile" i], input[placeholder*="phone" i]"#
//! );
//! ```

use crate::dom::{DomSnapshot, ElementSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an attribute value is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrOp {
    /// `[name="value"]`
    Equals,
    /// `[name*="value"]`
    Contains,
    /// `[name*="value" i]`
    ContainsIgnoreCase,
    /// `[name]`
    Present,
}

impl AttrOp {
    fn test(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Equals => actual == expected,
            Self::Contains => actual.contains(expected),
            Self::ContainsIgnoreCase => contains_ignore_case(actual, expected),
            Self::Present => true,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// One candidate way of finding an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// `#id`
    Id(String),
    /// Bare tag name
    Tag(String),
    /// `.class` token
    Class(String),
    /// Attribute comparison, optionally restricted to a tag
    Attr {
        /// Tag restriction
        tag: Option<String>,
        /// Attribute name
        name: String,
        /// Comparison
        op: AttrOp,
        /// Expected value (ignored for [`AttrOp::Present`])
        value: String,
    },
    /// `input[type=...]` or `button[type=...]`
    InputType {
        /// Element tag, usually `input`
        tag: String,
        /// Type attribute value
        kind: String,
    },
    /// Explicit or implicit ARIA role with an optional label substring
    Role {
        /// Role name
        role: String,
        /// Case-insensitive accessible-name substring
        label: Option<String>,
    },
    /// Case-insensitive visible-text substring
    Text {
        /// Tag restriction
        tag: Option<String>,
        /// Text to find
        text: String,
    },
    /// Every inner strategy must match
    All(Vec<Strategy>),
    /// The inner strategy must not match
    Not(Box<Strategy>),
    /// `target` with an ancestor matching `scope`
    Within {
        /// Ancestor matcher
        scope: Box<Strategy>,
        /// Element matcher
        target: Box<Strategy>,
    },
}

impl Strategy {
    /// `#id`
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Bare tag
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into().to_ascii_lowercase())
    }

    /// `.class`
    #[must_use]
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    /// Generic attribute comparison
    #[must_use]
    pub fn attr(name: impl Into<String>, op: AttrOp, value: impl Into<String>) -> Self {
        Self::Attr {
            tag: None,
            name: name.into(),
            op,
            value: value.into(),
        }
    }

    /// `[name="value"]`
    #[must_use]
    pub fn attr_eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::attr(name, AttrOp::Equals, value)
    }

    /// `[name*="value"]`
    #[must_use]
    pub fn attr_contains(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::attr(name, AttrOp::Contains, value)
    }

    /// `[name*="value" i]`
    #[must_use]
    pub fn attr_icontains(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::attr(name, AttrOp::ContainsIgnoreCase, value)
    }

    /// `[name]`
    #[must_use]
    pub fn attr_present(name: impl Into<String>) -> Self {
        Self::attr(name, AttrOp::Present, "")
    }

    /// `input[type=kind]`
    #[must_use]
    pub fn input_type(kind: impl Into<String>) -> Self {
        Self::InputType {
            tag: "input".to_string(),
            kind: kind.into(),
        }
    }

    /// `button[type=kind]`
    #[must_use]
    pub fn button_type(kind: impl Into<String>) -> Self {
        Self::InputType {
            tag: "button".to_string(),
            kind: kind.into(),
        }
    }

    /// Role without a label constraint
    #[must_use]
    pub fn role(role: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            label: None,
        }
    }

    /// Role whose accessible name contains `label`
    #[must_use]
    pub fn role_labelled(role: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            label: Some(label.into()),
        }
    }

    /// `tag:has-text("text")`
    #[must_use]
    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            tag: Some(tag.into().to_ascii_lowercase()),
            text: text.into(),
        }
    }

    /// `:has-text("text")` on any element
    #[must_use]
    pub fn any_text(text: impl Into<String>) -> Self {
        Self::Text {
            tag: None,
            text: text.into(),
        }
    }

    /// `:not(inner)`
    #[must_use]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// `scope target`
    #[must_use]
    pub fn within(scope: Self, target: Self) -> Self {
        Self::Within {
            scope: Box::new(scope),
            target: Box::new(target),
        }
    }

    /// Conjunction, flattening nested [`Strategy::All`]
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut parts = match self {
            Self::All(parts) => parts,
            single => vec![single],
        };
        match other {
            Self::All(more) => parts.extend(more),
            single => parts.push(single),
        }
        Self::All(parts)
    }

    /// Restrict to a tag
    #[must_use]
    pub fn tagged(self, tag: impl Into<String>) -> Self {
        let tag = tag.into().to_ascii_lowercase();
        match self {
            Self::Attr {
                name, op, value, ..
            } => Self::Attr {
                tag: Some(tag),
                name,
                op,
                value,
            },
            Self::Text { text, .. } => Self::Text {
                tag: Some(tag),
                text,
            },
            Self::InputType { kind, .. } => Self::InputType { tag, kind },
            other => Self::Tag(tag).and(other),
        }
    }

    /// Whether `element` satisfies this strategy
    #[must_use]
    pub fn matches(&self, dom: &DomSnapshot, element: &ElementSnapshot) -> bool {
        match self {
            Self::Id(id) => element.id() == Some(id.as_str()),
            Self::Tag(tag) => element.tag == *tag,
            Self::Class(class) => element.has_class(class),
            Self::Attr {
                tag,
                name,
                op,
                value,
            } => {
                tag_ok(tag.as_deref(), element)
                    && element.attr(name).is_some_and(|actual| op.test(actual, value))
            }
            // Explicit attribute only, as `input[type="text"]` would in CSS
            Self::InputType { tag, kind } => {
                element.tag == *tag
                    && element
                        .attr("type")
                        .is_some_and(|t| t.eq_ignore_ascii_case(kind))
            }
            Self::Role { role, label } => {
                element.role() == Some(role.as_str())
                    && label
                        .as_deref()
                        .map_or(true, |l| contains_ignore_case(element.accessible_name(), l))
            }
            Self::Text { tag, text } => {
                tag_ok(tag.as_deref(), element) && contains_ignore_case(element.visible_text(), text)
            }
            Self::All(parts) => parts.iter().all(|p| p.matches(dom, element)),
            Self::Not(inner) => !inner.matches(dom, element),
            Self::Within { scope, target } => {
                target.matches(dom, element) && dom.ancestors(element).any(|a| scope.matches(dom, a))
            }
        }
    }

    /// Matching elements in document order
    #[must_use]
    pub fn select<'a>(&self, dom: &'a DomSnapshot) -> Vec<&'a ElementSnapshot> {
        dom.elements()
            .iter()
            .filter(|el| self.matches(dom, el))
            .collect()
    }
}

fn tag_ok(tag: Option<&str>, element: &ElementSnapshot) -> bool {
    tag.map_or(true, |t| element.tag == t)
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Tag(tag) => write!(f, "{tag}"),
            Self::Class(class) => write!(f, ".{class}"),
            Self::Attr {
                tag,
                name,
                op,
                value,
            } => {
                if let Some(tag) = tag {
                    write!(f, "{tag}")?;
                }
                match op {
                    AttrOp::Equals => write!(f, "[{name}=\"{value}\"]"),
                    AttrOp::Contains => write!(f, "[{name}*=\"{value}\"]"),
                    AttrOp::ContainsIgnoreCase => write!(f, "[{name}*=\"{value}\" i]"),
                    AttrOp::Present => write!(f, "[{name}]"),
                }
            }
            Self::InputType { tag, kind } => write!(f, "{tag}[type=\"{kind}\"]"),
            Self::Role { role, label } => match label {
                Some(label) => write!(f, "role={role}[name=\"{label}\" i]"),
                None => write!(f, "role={role}"),
            },
            Self::Text { tag, text } => {
                if let Some(tag) = tag {
                    write!(f, "{tag}")?;
                }
                write!(f, ":has-text(\"{text}\")")
            }
            Self::All(parts) => parts.iter().try_for_each(|p| write!(f, "{p}")),
            Self::Not(inner) => write!(f, ":not({inner})"),
            Self::Within { scope, target } => write!(f, "{scope} {target}"),
        }
    }
}

/// A semantic field and its ordered strategies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    intent: String,
    strategies: Vec<Strategy>,
}

impl FieldRef {
    /// Field with no strategies yet
    #[must_use]
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            strategies: Vec::new(),
        }
    }

    /// Append a lower-priority strategy
    #[must_use]
    pub fn or(mut self, strategy: Strategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Semantic name
    #[must_use]
    pub fn intent(&self) -> &str {
        &self.intent
    }

    /// Strategies in priority order
    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Comma-joined strategy list
    #[must_use]
    pub fn describe(&self) -> String {
        self.strategies
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Index of the first strategy `element` satisfies
    #[must_use]
    pub fn first_matching_strategy(&self, dom: &DomSnapshot, element: &ElementSnapshot) -> Option<usize> {
        self.strategies.iter().position(|s| s.matches(dom, element))
    }

    /// Elements matching any strategy, in document order
    #[must_use]
    pub fn select_any<'a>(&self, dom: &'a DomSnapshot) -> Vec<&'a ElementSnapshot> {
        dom.elements()
            .iter()
            .filter(|el| self.first_matching_strategy(dom, el).is_some())
            .collect()
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.intent, self.describe())
    }
}
