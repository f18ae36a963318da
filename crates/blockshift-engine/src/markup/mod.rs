//! # Markup Fragments
//!
//! A small HTML fragment model. Blocks are stored as one root element each,
//! so only elements and text are kept; parsing is done by `html5ever`.
//!
//! ## Modules
//!
//! - **`parse`**: `parse_fragment` turns markup into a `Vec<Node>` using the
//!   HTML fragment algorithm
//! - **`node_list`**: `NodeList`, the normalized node-list attribute value
//!
//! ## Key Invariants
//!
//! - Tag and attribute names are lower-case
//! - Void elements (`br`, `hr`, `img`, `wbr`) never carry children
//! - Text is stored decoded and escaped again on render

pub mod node_list;
pub mod parse;

use serde::{Deserialize, Serialize};

pub use node_list::NodeList;
pub use parse::{MarkupError, parse_fragment};

const VOID_ELEMENTS: [&str; 4] = ["br", "hr", "img", "wbr"];

/// A node in a markup fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Number of characters this node contributes to plain text.
    pub fn text_len(&self) -> usize {
        match self {
            Node::Text(text) => text.chars().count(),
            Node::Element(element) if element.tag == "br" => 1,
            Node::Element(element) => element.children.iter().map(Node::text_len).sum(),
        }
    }

    pub(crate) fn write_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if element.tag == "br" => out.push('\n'),
            Node::Element(element) => {
                for child in &element.children {
                    child.write_text(out);
                }
            }
        }
    }

    pub(crate) fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
            Node::Element(element) => element.write_html(out),
        }
    }
}

/// An element with ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_children(&self, children: Vec<Node>) -> Self {
        Self {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whitespace separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    /// `property: value` pairs of the inline `style` attribute.
    pub fn style_declarations(&self) -> Vec<(String, String)> {
        self.attr("style")
            .unwrap_or_default()
            .split(';')
            .filter_map(|decl| {
                let (property, value) = decl.split_once(':')?;
                Some((
                    property.trim().to_ascii_lowercase(),
                    value.trim().to_string(),
                ))
            })
            .collect()
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
        out.push('>');
        if self.is_void() {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

/// Render a sequence of nodes back to markup.
pub fn render(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_html(&mut out);
    }
    out
}
