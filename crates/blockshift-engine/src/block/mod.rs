//! Block types and block instances.

mod instance;
mod level;

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::markup::NodeList;
use crate::schema::{AttributeKind, AttributeSchema, Attributes};
use crate::transform::TransformRule;

pub use instance::{BlockInstance, ClientId};
pub use level::HeadingLevel;

/// Unique identifier of a block type, e.g. `core/heading`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockName(String);

impl BlockName {
    pub fn new(name: impl Into<String>) -> Self {
        BlockName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockName {
    fn from(name: &str) -> Self {
        BlockName(name.to_string())
    }
}

impl From<String> for BlockName {
    fn from(name: String) -> Self {
        BlockName(name)
    }
}

impl Borrow<str> for BlockName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for BlockName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for BlockName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Optional editor features a block type advertises to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Supports {
    pub class_name: bool,
    pub anchor: bool,
    pub text_alignment: bool,
    pub drop_cap: bool,
}

/// Rich-text editing behaviour shared by paragraph-like block types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichText {
    /// The node-list attribute holding the editable content.
    pub content: String,
    /// Type created for the text after the cursor when the block is split.
    pub continuation: BlockName,
    /// Whether pattern transforms fire while the block is being typed into.
    pub accepts_patterns: bool,
    pub placeholder: String,
}

/// A registered kind of block.
#[derive(Debug, Clone)]
pub struct BlockType {
    name: BlockName,
    title: String,
    schema: AttributeSchema,
    default_node_level: Option<HeadingLevel>,
    rich_text: Option<RichText>,
    supports: Supports,
    pub(crate) transforms: Vec<TransformRule>,
}

impl BlockType {
    pub fn new(name: impl Into<BlockName>, title: &str, schema: AttributeSchema) -> Self {
        Self {
            name: name.into(),
            title: title.to_string(),
            schema,
            default_node_level: None,
            rich_text: None,
            supports: Supports::default(),
            transforms: Vec::new(),
        }
    }

    pub fn with_rich_text(mut self, rich_text: RichText) -> Self {
        self.rich_text = Some(rich_text);
        self
    }

    pub fn with_node_level(mut self, level: HeadingLevel) -> Self {
        self.default_node_level = Some(level);
        self
    }

    pub fn with_supports(mut self, supports: Supports) -> Self {
        self.supports = supports;
        self
    }

    pub fn with_transform(mut self, rule: TransformRule) -> Self {
        self.transforms.push(rule);
        self
    }

    pub fn name(&self) -> &BlockName {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    pub fn default_node_level(&self) -> Option<HeadingLevel> {
        self.default_node_level
    }

    pub fn rich_text(&self) -> Option<&RichText> {
        self.rich_text.as_ref()
    }

    pub fn supports(&self) -> Supports {
        self.supports
    }

    pub fn transforms(&self) -> &[TransformRule] {
        &self.transforms
    }

    /// Name of the attribute carrying the block's editable text.
    ///
    /// The rich-text content attribute when there is one, otherwise the first
    /// node-list attribute in the schema.
    pub fn content_attribute(&self) -> Option<&str> {
        match &self.rich_text {
            Some(rich_text) => Some(rich_text.content.as_str()),
            None => self
                .schema
                .specs()
                .iter()
                .find(|spec| spec.kind == AttributeKind::NodeList)
                .map(|spec| spec.name.as_str()),
        }
    }

    /// The content attribute's value, or an empty list.
    pub fn content_of(&self, attributes: &Attributes) -> NodeList {
        self.content_attribute()
            .and_then(|name| attributes.get(name))
            .and_then(|value| value.as_nodes())
            .cloned()
            .unwrap_or_default()
    }

    /// Concatenated plain text of every node-list attribute, in schema order.
    pub fn text_of(&self, attributes: &Attributes) -> String {
        self.schema
            .specs()
            .iter()
            .filter(|spec| spec.kind == AttributeKind::NodeList)
            .filter_map(|spec| attributes.get(&spec.name)?.as_nodes().map(NodeList::text))
            .collect()
    }
}
