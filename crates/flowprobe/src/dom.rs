//! DOM snapshot model.
//!
//! A driver reports the page as a flat, document-ordered list of element
//! snapshots. Every element carries a node id that stays stable for the
//! lifetime of the page, so two resolutions against an unchanged page agree.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Attribute used to stamp stable node ids onto live elements
pub const NODE_ID_ATTRIBUTE: &str = "data-flowprobe-node";

/// Stable identifier of one element within a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// CSS selector addressing this node in a live document
    #[must_use]
    pub fn css(&self) -> String {
        format!("[{NODE_ID_ATTRIBUTE}=\"{}\"]", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// One element as seen at snapshot time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Stable node id
    pub node: NodeId,
    /// Lower-case tag name
    pub tag: String,
    /// Attributes as written in markup
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Rendered text, trimmed
    #[serde(default)]
    pub text: String,
    /// Live `value` property for form controls
    #[serde(default)]
    pub value: Option<String>,
    /// Rendered with a non-empty box and not hidden by style
    #[serde(default)]
    pub visible: bool,
    /// Parent element, if any
    #[serde(default)]
    pub parent: Option<NodeId>,
}

impl ElementSnapshot {
    /// Create a visible element with no attributes
    #[must_use]
    pub fn new(node: NodeId, tag: impl Into<String>) -> Self {
        Self {
            node,
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: None,
            visible: true,
            parent: None,
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the parent
    #[must_use]
    pub const fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Attribute value by name
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The `id` attribute
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    /// Whether the element carries `class` token `name`
    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == name))
    }

    /// Input type, defaulting to `text` for inputs without one
    #[must_use]
    pub fn input_type(&self) -> Option<String> {
        match self.tag.as_str() {
            "input" => Some(
                self.attr("type")
                    .map_or_else(|| "text".to_string(), str::to_ascii_lowercase),
            ),
            "button" => Some(
                self.attr("type")
                    .map_or_else(|| "submit".to_string(), str::to_ascii_lowercase),
            ),
            _ => None,
        }
    }

    /// ARIA role implied by the tag when no `role` attribute is present
    #[must_use]
    pub fn implicit_role(&self) -> Option<&'static str> {
        let role = match self.tag.as_str() {
            "a" | "area" if self.attributes.contains_key("href") => "link",
            "button" => "button",
            "input" => match self.input_type().as_deref() {
                Some("button" | "submit" | "reset" | "image") => "button",
                Some("checkbox") => "checkbox",
                Some("radio") => "radio",
                Some("number") => "spinbutton",
                Some("range") => "slider",
                Some("search") => "searchbox",
                Some("text" | "email" | "tel" | "url") => "textbox",
                _ => return None,
            },
            "select" => {
                if self.attributes.contains_key("multiple") {
                    "listbox"
                } else {
                    "combobox"
                }
            }
            "textarea" => "textbox",
            "option" => "option",
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
            "img" => "img",
            "form" => "form",
            "nav" => "navigation",
            "main" => "main",
            "dialog" => "dialog",
            "ul" | "ol" => "list",
            "li" => "listitem",
            "table" => "table",
            _ => return None,
        };
        Some(role)
    }

    /// Effective role: the first token of `role`, else the implicit role
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.attr("role")
            .and_then(|r| r.split_whitespace().next())
            .or_else(|| self.implicit_role())
    }

    /// Text a user reads on the element; input buttons show their `value`
    #[must_use]
    pub fn visible_text(&self) -> &str {
        if self.tag == "input" {
            return self
                .value
                .as_deref()
                .or_else(|| self.attr("value"))
                .unwrap_or_default();
        }
        &self.text
    }

    /// Accessible name approximation: `aria-label`, then visible text
    #[must_use]
    pub fn accessible_name(&self) -> &str {
        match self.attr("aria-label") {
            Some(label) if !label.trim().is_empty() => label,
            _ => self.visible_text(),
        }
    }

    /// Current value of a form control
    #[must_use]
    pub fn current_value(&self) -> &str {
        self.value
            .as_deref()
            .or_else(|| self.attr("value"))
            .unwrap_or_default()
    }

    /// Whether this is a user-facing form control (not `type=hidden`)
    #[must_use]
    pub fn is_form_control(&self) -> bool {
        match self.tag.as_str() {
            "select" | "textarea" => true,
            "input" => !matches!(
                self.input_type().as_deref(),
                Some("hidden" | "submit" | "button" | "reset" | "image")
            ),
            _ => false,
        }
    }
}

/// Document-ordered snapshot of a page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<ElementSnapshot>")]
pub struct DomSnapshot {
    elements: Vec<ElementSnapshot>,
    index: HashMap<NodeId, usize>,
}

impl From<Vec<ElementSnapshot>> for DomSnapshot {
    fn from(elements: Vec<ElementSnapshot>) -> Self {
        Self::new(elements)
    }
}

impl DomSnapshot {
    /// Build a snapshot from elements already in document order
    #[must_use]
    pub fn new(elements: Vec<ElementSnapshot>) -> Self {
        let index = elements
            .iter()
            .enumerate()
            .map(|(pos, el)| (el.node, pos))
            .collect();
        Self { elements, index }
    }

    /// Parse the JSON array a driver script returns
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// All elements in document order
    #[must_use]
    pub fn elements(&self) -> &[ElementSnapshot] {
        &self.elements
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the snapshot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element by node id
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&ElementSnapshot> {
        self.index.get(&node).map(|&pos| &self.elements[pos])
    }

    /// Document position of a node
    #[must_use]
    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.index.get(&node).copied()
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors<'a>(
        &'a self,
        element: &'a ElementSnapshot,
    ) -> impl Iterator<Item = &'a ElementSnapshot> + 'a {
        let mut current = element.parent;
        // parent links come from the driver; bound the walk in case they cycle
        let mut budget = self.elements.len();
        std::iter::from_fn(move || {
            if budget == 0 {
                return None;
            }
            budget -= 1;
            let parent = self.get(current?)?;
            current = parent.parent;
            Some(parent)
        })
    }

    /// Nearest ancestor-or-self with the given tag
    #[must_use]
    pub fn closest<'a>(&'a self, element: &'a ElementSnapshot, tag: &str) -> Option<&'a ElementSnapshot> {
        if element.tag == tag {
            return Some(element);
        }
        self.ancestors(element).find(|el| el.tag == tag)
    }

    /// Direct children of a node in document order
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = &ElementSnapshot> {
        self.elements
            .iter()
            .filter(move |el| el.parent == Some(node))
    }

    /// Visible form controls with no `label[for]`, `aria-label`, `aria-labelledby`
    /// or wrapping `<label>`
    #[must_use]
    pub fn unlabelled_controls(&self) -> Vec<&ElementSnapshot> {
        let label_targets: Vec<&str> = self
            .elements
            .iter()
            .filter(|el| el.tag == "label")
            .filter_map(|el| el.attr("for"))
            .collect();

        self.elements
            .iter()
            .filter(|el| el.is_form_control() && el.visible)
            .filter(|el| {
                let by_for = el.id().is_some_and(|id| label_targets.contains(&id));
                let by_aria = ["aria-label", "aria-labelledby"]
                    .iter()
                    .any(|name| el.attr(name).is_some_and(|v| !v.trim().is_empty()));
                let wrapped = self.ancestors(el).any(|a| a.tag == "label");
                !(by_for || by_aria || wrapped)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn el(id: u64, tag: &str) -> ElementSnapshot {
        ElementSnapshot::new(NodeId(id), tag)
    }

    mod element_tests {
        use super::*;

        #[test]
        fn test_tag_is_lowercased() {
            assert_eq!(el(1, "INPUT").tag, "input");
        }

        #[test]
        fn test_implicit_roles() {
            assert_eq!(el(1, "a").with_attr("href", "/x").role(), Some("link"));
            assert_eq!(el(2, "a").role(), None);
            assert_eq!(el(3, "button").role(), Some("button"));
            assert_eq!(
                el(4, "input").with_attr("type", "submit").role(),
                Some("button")
            );
            assert_eq!(el(5, "input").role(), Some("textbox"));
            assert_eq!(
                el(6, "input").with_attr("type", "email").role(),
                Some("textbox")
            );
            assert_eq!(el(7, "select").role(), Some("combobox"));
            assert_eq!(el(8, "h2").role(), Some("heading"));
            assert_eq!(el(9, "input").with_attr("type", "password").role(), None);
        }

        #[test]
        fn test_explicit_role_wins() {
            let div = el(1, "div").with_attr("role", "combobox listbox");
            assert_eq!(div.role(), Some("combobox"));
        }

        #[test]
        fn test_input_button_text_is_value() {
            let input = el(1, "input")
                .with_attr("type", "submit")
                .with_attr("value", "Next");
            assert_eq!(input.visible_text(), "Next");
        }

        #[test]
        fn test_has_class_matches_tokens_only() {
            let div = el(1, "div").with_attr("class", "alert alert-success");
            assert!(div.has_class("alert-success"));
            assert!(!div.has_class("success"));
        }

        #[test]
        fn test_hidden_input_is_not_a_form_control() {
            assert!(!el(1, "input").with_attr("type", "hidden").is_form_control());
            assert!(el(2, "textarea").is_form_control());
        }
    }

    mod snapshot_tests {
        use super::*;

        #[test]
        fn test_ancestors_walk_to_root() {
            let dom = DomSnapshot::new(vec![
                el(1, "form"),
                el(2, "div").with_parent(NodeId(1)),
                el(3, "input").with_parent(NodeId(2)),
            ]);
            let input = dom.get(NodeId(3)).unwrap();
            let tags: Vec<&str> = dom.ancestors(input).map(|a| a.tag.as_str()).collect();
            assert_eq!(tags, vec!["div", "form"]);
            assert_eq!(dom.closest(input, "form").unwrap().node, NodeId(1));
        }

        #[test]
        fn test_ancestors_terminate_on_cycle() {
            let dom = DomSnapshot::new(vec![
                el(1, "div").with_parent(NodeId(2)),
                el(2, "div").with_parent(NodeId(1)),
            ]);
            let first = dom.get(NodeId(1)).unwrap();
            assert!(dom.ancestors(first).count() <= 2);
        }

        #[test]
        fn test_from_json() {
            let json = r#"[
                {"node": 1, "tag": "input", "attributes": {"id": "txtCellNumber"}, "visible": true},
                {"node": 2, "tag": "button", "text": "Next", "visible": false, "parent": 1}
            ]"#;
            let dom = DomSnapshot::from_json(json).unwrap();
            assert_eq!(dom.len(), 2);
            assert_eq!(dom.get(NodeId(1)).unwrap().id(), Some("txtCellNumber"));
            assert!(!dom.get(NodeId(2)).unwrap().visible);
            assert_eq!(dom.position(NodeId(2)), Some(1));
        }

        #[test]
        fn test_unlabelled_controls() {
            let dom = DomSnapshot::new(vec![
                el(1, "label").with_attr("for", "mobile"),
                el(2, "input").with_attr("id", "mobile"),
                el(3, "input").with_attr("aria-label", "Email"),
                el(4, "input").with_attr("name", "orphan"),
                el(5, "input").with_attr("type", "hidden"),
                el(6, "label"),
                el(7, "select").with_parent(NodeId(6)),
                el(8, "input").with_visible(false),
            ]);
            let missing: Vec<NodeId> = dom.unlabelled_controls().iter().map(|e| e.node).collect();
            assert_eq!(missing, vec![NodeId(4)]);
        }

        #[test]
        fn test_node_css() {
            assert_eq!(NodeId(7).css(), "[data-flowprobe-node=\"7\"]");
        }
    }
}
