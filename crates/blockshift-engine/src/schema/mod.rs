//! # Attribute Schema
//!
//! Declares the persisted shape of a block type and how each attribute is
//! read from, and written back to, the block's stored markup.
//!
//! A schema is a [`RootShape`] (which element the block is stored as) plus an
//! ordered list of [`AttributeSpec`]s, each naming a [`Source`] relative to
//! that root element.
//!
//! ## Key Invariants
//!
//! - `extract(serialize(v)) == with_defaults(v)` for every `v` that validates
//! - Unknown attributes, classes and style properties are rejected, never dropped

mod value;

use std::collections::HashSet;
use std::fmt;

use crate::block::BlockName;
use crate::error::BlockError;
use crate::markup::{Element, Node, NodeList, parse_fragment};

pub use value::{AttributeKind, AttributeValue, Attributes};

/// Comma separated list of tag names an element may have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector(Vec<String>);

impl Selector {
    pub fn new(tags: &str) -> Self {
        Selector(
            tags.split(',')
                .map(|tag| tag.trim().to_ascii_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect(),
        )
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.0.iter().any(|candidate| candidate.eq_ignore_ascii_case(tag))
    }

    pub fn tags(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// How the root element's tag is chosen when serializing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRule {
    Fixed(String),
    /// Taken from a `TagName` sourced attribute, e.g. `nodeName = "H3"` → `<h3>`.
    FromAttribute(String),
}

/// The element a block is stored as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootShape {
    pub selector: Selector,
    pub tag: TagRule,
    /// Classes always present on the root, e.g. `o-lede`.
    pub classes: Vec<String>,
}

impl RootShape {
    pub fn element(tag: &str) -> Self {
        Self {
            selector: Selector::new(tag),
            tag: TagRule::Fixed(tag.to_ascii_lowercase()),
            classes: Vec::new(),
        }
    }

    pub fn tag_from(selector: &str, attribute: &str) -> Self {
        Self {
            selector: Selector::new(selector),
            tag: TagRule::FromAttribute(attribute.to_string()),
            classes: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }
}

/// Where an attribute lives on the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The element's inner nodes.
    Children,
    /// The upper-cased tag name (`H2`).
    TagName,
    /// An element attribute.
    Attribute(String),
    /// Presence of a class.
    Class(String),
    /// A declaration in the inline `style`.
    Style(String),
}

impl Source {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Source::Children => AttributeKind::NodeList,
            Source::Class(_) => AttributeKind::Flag,
            Source::TagName | Source::Attribute(_) | Source::Style(_) => AttributeKind::Primitive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: String,
    pub kind: AttributeKind,
    pub source: Source,
    pub default: Option<AttributeValue>,
    /// Permitted primitive values; empty means unrestricted.
    pub allowed: Vec<String>,
}

impl AttributeSpec {
    pub fn node_list(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: AttributeKind::NodeList,
            source: Source::Children,
            default: Some(AttributeValue::Nodes(NodeList::empty())),
            allowed: Vec::new(),
        }
    }

    pub fn flag(name: &str, class: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: AttributeKind::Flag,
            source: Source::Class(class.to_string()),
            default: Some(AttributeValue::Flag(false)),
            allowed: Vec::new(),
        }
    }

    pub fn primitive(name: &str, source: Source) -> Self {
        Self {
            name: name.to_string(),
            kind: AttributeKind::Primitive,
            source,
            default: None,
            allowed: Vec::new(),
        }
    }

    pub fn with_default(mut self, value: impl Into<AttributeValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    root: RootShape,
    specs: Vec<AttributeSpec>,
}

impl AttributeSchema {
    pub fn new(root: RootShape) -> Self {
        Self {
            root,
            specs: Vec::new(),
        }
    }

    pub fn with(mut self, spec: AttributeSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn root(&self) -> &RootShape {
        &self.root
    }

    pub fn specs(&self) -> &[AttributeSpec] {
        &self.specs
    }

    pub fn spec(&self, name: &str) -> Option<&AttributeSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Check that the schema is self-consistent. Run once at registration.
    pub(crate) fn check(&self, block: &BlockName) -> Result<(), BlockError> {
        if self.root.selector.tags().is_empty() {
            return Err(BlockError::schema(block, "root selector is empty"));
        }
        match &self.root.tag {
            TagRule::Fixed(tag) if !self.root.selector.matches(tag) => {
                return Err(BlockError::schema(
                    block,
                    format!("root tag <{tag}> is not matched by '{}'", self.root.selector),
                ));
            }
            TagRule::FromAttribute(name) => {
                let from_tag = self
                    .spec(name)
                    .is_some_and(|spec| spec.source == Source::TagName);
                if !from_tag {
                    return Err(BlockError::schema(
                        block,
                        format!("root tag attribute '{name}' must be sourced from the tag name"),
                    ));
                }
            }
            TagRule::Fixed(_) => {}
        }

        let mut names = HashSet::new();
        let mut children_sources = 0;
        for spec in &self.specs {
            if !names.insert(spec.name.as_str()) {
                return Err(BlockError::schema(
                    block,
                    format!("attribute '{}' is declared twice", spec.name),
                ));
            }
            if spec.source.kind() != spec.kind {
                return Err(BlockError::schema(
                    block,
                    format!(
                        "attribute '{}' is a {} but its source yields a {}",
                        spec.name,
                        spec.kind,
                        spec.source.kind()
                    ),
                ));
            }
            if !spec.allowed.is_empty() && spec.kind != AttributeKind::Primitive {
                return Err(BlockError::schema(
                    block,
                    format!("attribute '{}' restricts values but is not primitive", spec.name),
                ));
            }
            match &spec.source {
                Source::Children => children_sources += 1,
                Source::TagName if self.root.tag != TagRule::FromAttribute(spec.name.clone()) => {
                    return Err(BlockError::schema(
                        block,
                        format!("attribute '{}' reads the tag name but does not choose it", spec.name),
                    ));
                }
                Source::Attribute(attr) if attr == "class" || attr == "style" => {
                    return Err(BlockError::schema(
                        block,
                        format!("attribute '{}' cannot be sourced from '{attr}'", spec.name),
                    ));
                }
                Source::Class(class) if self.root.classes.contains(class) => {
                    return Err(BlockError::schema(
                        block,
                        format!("flag '{}' uses the static class '{class}'", spec.name),
                    ));
                }
                _ => {}
            }
            if let Some(default) = &spec.default {
                self.check_value(block, spec, default)?;
            }
        }
        if children_sources > 1 {
            return Err(BlockError::schema(block, "more than one attribute reads the children"));
        }
        Ok(())
    }

    /// Reject unknown attributes and values that do not fit their spec.
    pub fn validate(&self, block: &BlockName, attributes: &Attributes) -> Result<(), BlockError> {
        for (name, value) in attributes {
            let spec = self
                .spec(name)
                .ok_or_else(|| BlockError::schema(block, format!("unknown attribute '{name}'")))?;
            self.check_value(block, spec, value)?;
        }
        Ok(())
    }

    fn check_value(
        &self,
        block: &BlockName,
        spec: &AttributeSpec,
        value: &AttributeValue,
    ) -> Result<(), BlockError> {
        if value.kind() != spec.kind {
            return Err(BlockError::schema(
                block,
                format!(
                    "attribute '{}' expects a {}, found a {}",
                    spec.name,
                    spec.kind,
                    value.kind()
                ),
            ));
        }
        let Some(text) = value.as_text() else {
            return Ok(());
        };
        if !spec.allowed.is_empty() && !spec.allowed.iter().any(|allowed| allowed == text) {
            return Err(BlockError::schema(
                block,
                format!(
                    "attribute '{}' must be one of [{}], found '{text}'",
                    spec.name,
                    spec.allowed.join(", ")
                ),
            ));
        }
        match &spec.source {
            Source::TagName
                if !self.root.selector.matches(text) || text != text.to_ascii_uppercase() =>
            {
                Err(BlockError::schema(
                    block,
                    format!("'{text}' is not an upper-case tag in '{}'", self.root.selector),
                ))
            }
            Source::Style(_)
                if text.is_empty() || text.trim() != text || text.contains([';', ':']) =>
            {
                Err(BlockError::schema(
                    block,
                    format!("'{text}' is not a valid value for style attribute '{}'", spec.name),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Fill in defaults for attributes that are absent.
    pub fn with_defaults(&self, attributes: &Attributes) -> Attributes {
        let mut filled = attributes.clone();
        for spec in &self.specs {
            if let Some(default) = &spec.default
                && !filled.contains_key(&spec.name)
            {
                filled.insert(spec.name.clone(), default.clone());
            }
        }
        filled
    }

    /// Deserialize attributes from a markup fragment holding one root element.
    pub fn extract(&self, block: &BlockName, markup: &str) -> Result<Attributes, BlockError> {
        let nodes =
            parse_fragment(markup).map_err(|err| BlockError::schema(block, err.to_string()))?;
        let element = single_root(block, nodes)?;
        self.extract_element(block, &element)
    }

    pub fn extract_element(
        &self,
        block: &BlockName,
        element: &Element,
    ) -> Result<Attributes, BlockError> {
        if !self.root.selector.matches(&element.tag) {
            return Err(BlockError::schema(
                block,
                format!("expected one of <{}>, found <{}>", self.root.selector, element.tag),
            ));
        }

        let classes: Vec<&str> = element.classes().collect();
        if let Some(missing) = self
            .root
            .classes
            .iter()
            .find(|class| !classes.contains(&class.as_str()))
        {
            return Err(BlockError::schema(block, format!("missing class '{missing}'")));
        }
        for class in &classes {
            let known = self.root.classes.iter().any(|c| c == class)
                || self
                    .specs
                    .iter()
                    .any(|spec| matches!(&spec.source, Source::Class(c) if c == class));
            if !known {
                return Err(BlockError::schema(block, format!("unknown class '{class}'")));
            }
        }

        let styles = element.style_declarations();
        for (property, _) in &styles {
            let known = self
                .specs
                .iter()
                .any(|spec| matches!(&spec.source, Source::Style(p) if p == property));
            if !known {
                return Err(BlockError::schema(
                    block,
                    format!("unknown style property '{property}'"),
                ));
            }
        }

        for (name, _) in &element.attrs {
            let known = name == "class"
                || name == "style"
                || self
                    .specs
                    .iter()
                    .any(|spec| matches!(&spec.source, Source::Attribute(a) if a == name));
            if !known {
                return Err(BlockError::schema(
                    block,
                    format!("unknown attribute '{name}' on <{}>", element.tag),
                ));
            }
        }

        let mut attributes = Attributes::new();
        for spec in &self.specs {
            let value = match &spec.source {
                Source::Children => Some(AttributeValue::Nodes(NodeList::new(
                    element.children.clone(),
                ))),
                Source::TagName => Some(AttributeValue::Text(element.tag.to_ascii_uppercase())),
                Source::Attribute(attr) => element
                    .attr(attr)
                    .map(|value| AttributeValue::Text(value.to_string())),
                Source::Class(class) => {
                    Some(AttributeValue::Flag(classes.contains(&class.as_str())))
                }
                Source::Style(property) => styles
                    .iter()
                    .find(|(p, _)| p == property)
                    .map(|(_, value)| AttributeValue::Text(value.clone())),
            };
            if let Some(value) = value.or_else(|| spec.default.clone()) {
                attributes.insert(spec.name.clone(), value);
            }
        }

        self.validate(block, &attributes)?;
        Ok(attributes)
    }

    /// Serialize attributes into the block's root element markup.
    pub fn serialize(&self, block: &BlockName, attributes: &Attributes) -> Result<String, BlockError> {
        Ok(self.to_element(block, attributes)?.to_html())
    }

    pub fn to_element(
        &self,
        block: &BlockName,
        attributes: &Attributes,
    ) -> Result<Element, BlockError> {
        self.validate(block, attributes)?;
        let attributes = self.with_defaults(attributes);

        let tag = match &self.root.tag {
            TagRule::Fixed(tag) => tag.clone(),
            TagRule::FromAttribute(name) => attributes
                .get(name)
                .and_then(AttributeValue::as_text)
                .map(str::to_ascii_lowercase)
                .ok_or_else(|| BlockError::schema(block, format!("missing attribute '{name}'")))?,
        };
        let mut element = Element::new(tag);

        let mut classes = self.root.classes.clone();
        let mut styles = Vec::new();
        let mut extra = Vec::new();
        let mut children = Vec::new();
        for spec in &self.specs {
            let Some(value) = attributes.get(&spec.name) else {
                continue;
            };
            match (&spec.source, value) {
                (Source::Class(class), AttributeValue::Flag(true)) => classes.push(class.clone()),
                (Source::Style(property), AttributeValue::Text(text)) => {
                    styles.push(format!("{property}:{text}"))
                }
                (Source::Attribute(attr), AttributeValue::Text(text)) => {
                    extra.push((attr.clone(), text.clone()))
                }
                (Source::Children, AttributeValue::Nodes(nodes)) => {
                    children = nodes.nodes().to_vec()
                }
                _ => {}
            }
        }

        if !classes.is_empty() {
            element = element.with_attr("class", classes.join(" "));
        }
        if !styles.is_empty() {
            element = element.with_attr("style", styles.join(";"));
        }
        element.attrs.extend(extra);
        element.children = children;
        Ok(element)
    }
}

/// The single element of a fragment, ignoring surrounding whitespace.
pub(crate) fn single_root(block: &BlockName, nodes: Vec<Node>) -> Result<Element, BlockError> {
    let mut root = None;
    for node in nodes {
        match node {
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Text(text) => {
                return Err(BlockError::schema(
                    block,
                    format!("unexpected text outside the root element: '{}'", text.trim()),
                ));
            }
            Node::Element(element) => {
                if root.is_some() {
                    return Err(BlockError::schema(block, "expected a single root element"));
                }
                root = Some(element);
            }
        }
    }
    root.ok_or_else(|| BlockError::schema(block, "no root element found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block() -> BlockName {
        BlockName::from("test/lede")
    }

    fn lede_schema() -> AttributeSchema {
        AttributeSchema::new(RootShape::element("p").with_class("o-lede"))
            .with(AttributeSpec::node_list("content"))
            .with(AttributeSpec::flag("dropCap", "o-dropcap"))
            .with(AttributeSpec::primitive("align", Source::Style("text-align".into())))
            .with(AttributeSpec::primitive("anchor", Source::Attribute("id".into())))
    }

    fn heading_schema() -> AttributeSchema {
        AttributeSchema::new(RootShape::tag_from("h1,h2,h3,h4,h5,h6", "nodeName"))
            .with(AttributeSpec::node_list("content"))
            .with(
                AttributeSpec::primitive("nodeName", Source::TagName)
                    .with_default("H2")
                    .one_of(["H1", "H2", "H3", "H4", "H5", "H6"]),
            )
    }

    #[test]
    fn extracts_every_source_kind() {
        let attrs = lede_schema()
            .extract(
                &block(),
                r#"<p class="o-lede o-dropcap" style="text-align:center" id="top">Hi <em>there</em></p>"#,
            )
            .unwrap();

        assert_eq!(attrs["dropCap"], AttributeValue::Flag(true));
        assert_eq!(attrs["align"], AttributeValue::from("center"));
        assert_eq!(attrs["anchor"], AttributeValue::from("top"));
        assert_eq!(
            attrs["content"].as_nodes().unwrap().to_html(),
            "Hi <em>there</em>"
        );
    }

    #[test]
    fn missing_optional_attributes_use_defaults() {
        let attrs = lede_schema()
            .extract(&block(), r#"<p class="o-lede"></p>"#)
            .unwrap();

        assert_eq!(attrs["dropCap"], AttributeValue::Flag(false));
        assert_eq!(attrs["content"], AttributeValue::Nodes(NodeList::empty()));
        assert!(!attrs.contains_key("align"));
    }

    #[test]
    fn serializes_flags_as_classes() {
        let mut attrs = Attributes::new();
        attrs.insert("content".into(), NodeList::from_text("Hi").into());
        attrs.insert("dropCap".into(), true.into());

        assert_eq!(
            lede_schema().serialize(&block(), &attrs).unwrap(),
            r#"<p class="o-lede o-dropcap">Hi</p>"#
        );
    }

    #[test]
    fn heading_tag_follows_node_name() {
        let schema = heading_schema();
        let mut attrs = Attributes::new();
        attrs.insert("nodeName".into(), "H3".into());
        attrs.insert("content".into(), NodeList::from_text("Title").into());

        let markup = schema.serialize(&block(), &attrs).unwrap();
        assert_eq!(markup, "<h3>Title</h3>");
        assert_eq!(schema.extract(&block(), &markup).unwrap(), attrs);
    }

    #[test]
    fn round_trip_preserves_text_verbatim() {
        let schema = lede_schema();
        let mut attrs = Attributes::new();
        attrs.insert(
            "content".into(),
            NodeList::new(parse_fragment("  a &lt; b <strong>&amp;</strong>  <br>c ").unwrap())
                .into(),
        );
        attrs.insert("dropCap".into(), false.into());
        attrs.insert("anchor".into(), "say \"hi\"".into());

        let markup = schema.serialize(&block(), &attrs).unwrap();
        assert_eq!(schema.extract(&block(), &markup).unwrap(), attrs);
    }

    #[test]
    fn rejects_unknown_attribute_on_construct() {
        let mut attrs = Attributes::new();
        attrs.insert("nodeName".into(), "P".into());

        let err = lede_schema().validate(&block(), &attrs).unwrap_err();
        assert_eq!(
            err,
            BlockError::SchemaViolation {
                block: block(),
                reason: "unknown attribute 'nodeName'".into(),
            }
        );
    }

    #[test]
    fn rejects_unknown_markup() {
        let schema = lede_schema();
        for markup in [
            r#"<p class="o-lede extra">x</p>"#,
            r#"<p class="o-lede" data-x="1">x</p>"#,
            r#"<p class="o-lede" style="color:red">x</p>"#,
            r#"<p>x</p>"#,
            r#"<div class="o-lede">x</div>"#,
            r#"<p class="o-lede">x</p><p class="o-lede">y</p>"#,
            r#"stray <p class="o-lede">x</p>"#,
            r#"<p class="o-lede">x"#,
        ] {
            assert!(
                matches!(
                    schema.extract(&block(), markup),
                    Err(BlockError::SchemaViolation { .. })
                ),
                "{markup} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_kind_mismatch_and_disallowed_values() {
        let schema = heading_schema();
        let mut attrs = Attributes::new();
        attrs.insert("content".into(), true.into());
        assert!(schema.validate(&block(), &attrs).is_err());

        let mut attrs = Attributes::new();
        attrs.insert("nodeName".into(), "H7".into());
        assert!(schema.validate(&block(), &attrs).is_err());
    }

    #[test]
    fn check_rejects_inconsistent_schemas() {
        let bad_default = AttributeSchema::new(RootShape::element("p"))
            .with(AttributeSpec::flag("dropCap", "x").with_default("yes"));
        assert!(bad_default.check(&block()).is_err());

        let duplicate = AttributeSchema::new(RootShape::element("p"))
            .with(AttributeSpec::node_list("content"))
            .with(AttributeSpec::node_list("content"));
        assert!(duplicate.check(&block()).is_err());

        let unchosen_tag = AttributeSchema::new(RootShape::element("h2"))
            .with(AttributeSpec::primitive("nodeName", Source::TagName));
        assert!(unchosen_tag.check(&block()).is_err());

        assert!(lede_schema().check(&block()).is_ok());
        assert!(heading_schema().check(&block()).is_ok());
    }
}
