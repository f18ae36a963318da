use serde::{Deserialize, Serialize};

use super::{Node, render};

/// Ordered inline content of a block (the value of a node-list attribute).
///
/// Always normalized: adjacent text is merged, empty text and empty
/// non-void elements are dropped, and adjacent elements with identical tag
/// and attributes are coalesced. Two lists with the same rendering therefore
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Node>", into = "Vec<Node>")]
pub struct NodeList(Vec<Node>);

impl NodeList {
    pub fn new(nodes: Vec<Node>) -> Self {
        NodeList(normalize(nodes))
    }

    pub fn empty() -> Self {
        NodeList(Vec::new())
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![Node::Text(text.into())])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Plain text with formatting removed; `<br>` becomes `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.0 {
            node.write_text(&mut out);
        }
        out
    }

    /// Length of [`NodeList::text`] in characters.
    pub fn text_len(&self) -> usize {
        self.0.iter().map(Node::text_len).sum()
    }

    /// `self` followed by `other`.
    pub fn concat(&self, other: &NodeList) -> NodeList {
        let mut nodes = self.0.clone();
        nodes.extend(other.0.iter().cloned());
        NodeList::new(nodes)
    }

    /// Divide the list at a character offset into its plain text.
    ///
    /// Formatting elements straddling the offset are cloned onto both sides.
    /// Offsets past the end leave the second half empty.
    pub fn split_at(&self, offset: usize) -> (NodeList, NodeList) {
        let (before, after) = split_nodes(&self.0, offset);
        (NodeList::new(before), NodeList::new(after))
    }

    pub fn to_html(&self) -> String {
        render(&self.0)
    }
}

impl From<Vec<Node>> for NodeList {
    fn from(nodes: Vec<Node>) -> Self {
        NodeList::new(nodes)
    }
}

impl From<NodeList> for Vec<Node> {
    fn from(list: NodeList) -> Self {
        list.0
    }
}

impl From<&str> for NodeList {
    fn from(text: &str) -> Self {
        NodeList::from_text(text)
    }
}

fn normalize(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                if let Some(Node::Text(previous)) = out.last_mut() {
                    previous.push_str(&text);
                } else {
                    out.push(Node::Text(text));
                }
            }
            Node::Element(mut element) => {
                element.tag.make_ascii_lowercase();
                for (name, _) in element.attrs.iter_mut() {
                    name.make_ascii_lowercase();
                }
                if element.is_void() {
                    element.children.clear();
                    out.push(Node::Element(element));
                    continue;
                }
                element.children = normalize(std::mem::take(&mut element.children));
                if element.children.is_empty() {
                    continue;
                }
                if let Some(Node::Element(previous)) = out.last_mut()
                    && !previous.is_void()
                    && previous.tag == element.tag
                    && previous.attrs == element.attrs
                {
                    let mut children = std::mem::take(&mut previous.children);
                    children.extend(element.children);
                    previous.children = normalize(children);
                } else {
                    out.push(Node::Element(element));
                }
            }
        }
    }
    out
}

fn split_nodes(nodes: &[Node], offset: usize) -> (Vec<Node>, Vec<Node>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut remaining = offset;

    for node in nodes {
        let len = node.text_len();
        if remaining == 0 {
            after.push(node.clone());
        } else if len <= remaining {
            remaining -= len;
            before.push(node.clone());
        } else {
            // Only text and non-void elements can be longer than one char.
            match node {
                Node::Text(text) => {
                    let at = text
                        .char_indices()
                        .nth(remaining)
                        .map_or(text.len(), |(index, _)| index);
                    before.push(Node::Text(text[..at].to_string()));
                    after.push(Node::Text(text[at..].to_string()));
                }
                Node::Element(element) => {
                    let (head, tail) = split_nodes(&element.children, remaining);
                    before.push(Node::Element(element.with_children(head)));
                    after.push(Node::Element(element.with_children(tail)));
                }
            }
            remaining = 0;
        }
    }

    (before, after)
}
