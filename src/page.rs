//! In-memory host document the widget reads from and injects into.

use kuchiki::NodeRef;
use kuchiki::traits::*;
use thiserror::Error;

const FRAGMENT_WRAPPER_ID: &str = "__chatbot_fragment_wrapper";

#[derive(Debug, Error)]
pub enum PageError {
    #[error("query selector {0} failed")]
    Selector(String),
    #[error("fragment parse failed: {0}")]
    Fragment(String),
}

/// A parsed HTML page. Cloning shares the same tree.
#[derive(Clone)]
pub struct HostPage {
    document: NodeRef,
}

impl HostPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: kuchiki::parse_html().one(html),
        }
    }

    pub fn document(&self) -> &NodeRef {
        &self.document
    }

    /// Finds an element by exact `id` attribute, without going through CSS
    /// selector syntax so arbitrary ids are matched literally.
    pub fn element_by_id(&self, id: &str) -> Option<NodeRef> {
        self.document
            .descendants()
            .elements()
            .find(|el| el.attributes.borrow().get("id") == Some(id))
            .map(|el| el.as_node().clone())
    }

    pub fn select_all(&self, selector: &str) -> Result<Vec<NodeRef>, PageError> {
        let nodes = self
            .document
            .select(selector)
            .map_err(|_| PageError::Selector(selector.to_string()))?;
        Ok(nodes.map(|n| n.as_node().clone()).collect())
    }

    pub fn head(&self) -> Option<NodeRef> {
        self.document
            .select_first("head")
            .ok()
            .map(|n| n.as_node().clone())
    }

    pub fn to_html(&self) -> String {
        self.document.to_string()
    }
}

/// Parses an HTML snippet and returns its top-level nodes, detached and ready
/// to be appended elsewhere.
pub fn parse_fragment(html: &str) -> Result<Vec<NodeRef>, PageError> {
    let wrapper_html = format!("<div id=\"{FRAGMENT_WRAPPER_ID}\">{html}</div>");
    let fragment_doc = kuchiki::parse_html().one(wrapper_html);
    let wrapper = fragment_doc
        .select_first(&format!("#{FRAGMENT_WRAPPER_ID}"))
        .map_err(|_| PageError::Fragment("wrapper element missing".to_string()))?;
    let children: Vec<_> = wrapper.as_node().children().collect();
    for child in &children {
        child.detach();
    }
    Ok(children)
}

/// Parses a snippet expected to contain exactly one element.
pub fn parse_element(html: &str) -> Result<NodeRef, PageError> {
    parse_fragment(html)?
        .into_iter()
        .find(|n| n.as_element().is_some())
        .ok_or_else(|| PageError::Fragment(format!("no element in {html}")))
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|el| el.attributes.borrow().get(name).map(str::to_string))
}

pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(el) = node.as_element() {
        el.attributes.borrow_mut().insert(name, value.to_string());
    }
}

pub fn has_class(node: &NodeRef, class: &str) -> bool {
    attr(node, "class")
        .map(|classes| classes.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Adds or removes `class` so that its presence matches `present`.
pub fn toggle_class(node: &NodeRef, class: &str, present: bool) {
    let current = attr(node, "class").unwrap_or_default();
    let mut classes: Vec<&str> = current
        .split_whitespace()
        .filter(|c| *c != class)
        .collect();
    if present {
        classes.push(class);
    }
    set_attr(node, "class", &classes.join(" "));
}

pub fn clear_children(node: &NodeRef) {
    let existing: Vec<_> = node.children().collect();
    for child in existing {
        child.detach();
    }
}

/// Replaces the node's children with a single text node. The text is never
/// interpreted as markup.
pub fn set_text(node: &NodeRef, text: &str) {
    clear_children(node);
    node.append(NodeRef::new_text(text));
}
