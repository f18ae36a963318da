use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::markup::NodeList;

/// Attribute values of a block, keyed by attribute name.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// The semantic kind of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// A plain string (`nodeName`, `align`, `anchor`).
    Primitive,
    /// Inline rich-text content.
    NodeList,
    /// A boolean presence flag.
    Flag,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::Primitive => "primitive",
            AttributeKind::NodeList => "node-list",
            AttributeKind::Flag => "flag",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Text(String),
    Nodes(NodeList),
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Text(_) => AttributeKind::Primitive,
            AttributeValue::Nodes(_) => AttributeKind::NodeList,
            AttributeValue::Flag(_) => AttributeKind::Flag,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_nodes(&self) -> Option<&NodeList> {
        match self {
            AttributeValue::Nodes(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AttributeValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(flag: bool) -> Self {
        AttributeValue::Flag(flag)
    }
}

impl From<&str> for AttributeValue {
    fn from(text: &str) -> Self {
        AttributeValue::Text(text.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(text: String) -> Self {
        AttributeValue::Text(text)
    }
}

impl From<NodeList> for AttributeValue {
    fn from(nodes: NodeList) -> Self {
        AttributeValue::Nodes(nodes)
    }
}
