//! `core/paragraph`, and the paragraph-like pieces other types delegate to.

use super::FeatureFlags;
use crate::block::{BlockName, BlockType, RichText, Supports};
use crate::schema::{AttributeSchema, AttributeSpec, AttributeValue, RootShape, Source};
use crate::transform::{BlockSpec, TransformInput};

pub const NAME: &str = "core/paragraph";

/// Name of the editable content attribute shared by paragraph-like types.
pub const CONTENT: &str = "content";

pub fn block_type(features: FeatureFlags<'_>) -> BlockType {
    let mut schema = AttributeSchema::new(RootShape::element("p"))
        .with(content_spec())
        .with(drop_cap_spec("has-drop-cap"));
    if features(NAME, "textAlignment") {
        schema = schema.with(align_spec());
    }

    BlockType::new(NAME, "Paragraph", schema)
        .with_rich_text(rich_text(NAME, true, "Start writing"))
        .with_supports(Supports {
            class_name: features(NAME, "className"),
            anchor: false,
            text_alignment: features(NAME, "textAlignment"),
            drop_cap: true,
        })
}

pub fn content_spec() -> AttributeSpec {
    AttributeSpec::node_list(CONTENT)
}

pub fn drop_cap_spec(class: &str) -> AttributeSpec {
    AttributeSpec::flag("dropCap", class)
}

pub fn align_spec() -> AttributeSpec {
    AttributeSpec::primitive("align", Source::Style("text-align".into()))
        .one_of(["left", "center", "right"])
}

pub fn rich_text(continuation: &str, accepts_patterns: bool, placeholder: &str) -> RichText {
    RichText {
        content: CONTENT.to_string(),
        continuation: BlockName::from(continuation),
        accepts_patterns,
        placeholder: placeholder.to_string(),
    }
}

/// A convert function moving the content into a single `target` block.
pub fn carry_content(
    target: &'static str,
) -> impl Fn(&TransformInput) -> Vec<BlockSpec> + Send + Sync {
    move |input| vec![BlockSpec::new(target).with(CONTENT, input.content.clone())]
}

/// Like [`carry_content`], also keeping the drop cap when the source had one.
pub fn carry_content_and_drop_cap(
    target: &'static str,
) -> impl Fn(&TransformInput) -> Vec<BlockSpec> + Send + Sync {
    move |input| {
        let spec = BlockSpec::new(target).with(CONTENT, input.content.clone());
        vec![match input.attributes.get("dropCap") {
            Some(AttributeValue::Flag(true)) => spec.with("dropCap", true),
            _ => spec,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::all_features;
    use crate::markup::NodeList;
    use crate::schema::Attributes;
    use pretty_assertions::assert_eq;

    #[test]
    fn alignment_is_feature_gated() {
        let with = block_type(&all_features);
        let without = block_type(&|_: &str, feature: &str| feature != "textAlignment");

        assert!(with.schema().spec("align").is_some());
        assert!(without.schema().spec("align").is_none());
        assert!(!without.supports().text_alignment);
    }

    #[test]
    fn carry_content_keeps_drop_cap_only_when_set() {
        let convert = carry_content_and_drop_cap("blockshift/lede-copy");
        let mut attributes = Attributes::new();
        attributes.insert("dropCap".into(), true.into());
        let input = TransformInput {
            source: NAME.into(),
            attributes,
            content: NodeList::from_text("Hi"),
            captures: Vec::new(),
        };

        let specs = convert(&input);
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].attributes["dropCap"], AttributeValue::Flag(true));
        assert_eq!(
            specs[0].attributes[CONTENT],
            AttributeValue::Nodes(NodeList::from_text("Hi"))
        );
    }
}
