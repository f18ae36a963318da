//! `core/heading`: `<h1>`..`<h6>`, level chosen by `nodeName`.

use super::{FeatureFlags, heading_marker, lede, paragraph};
use crate::block::{BlockType, HeadingLevel, Supports};
use crate::schema::{AttributeSchema, AttributeSpec, RootShape, Source};
use crate::transform::{BlockSpec, TransformRule};

pub const NAME: &str = "core/heading";

/// Attribute holding the upper-case element name, e.g. `H3`.
pub const LEVEL: &str = "nodeName";

const DEFAULT_LEVEL: HeadingLevel = HeadingLevel::H2;

pub fn block_type(features: FeatureFlags<'_>) -> BlockType {
    let selector = HeadingLevel::ALL
        .iter()
        .map(|level| level.node_name().to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(",");
    let mut schema = AttributeSchema::new(RootShape::tag_from(&selector, LEVEL))
        .with(paragraph::content_spec())
        .with(
            AttributeSpec::primitive(LEVEL, Source::TagName)
                .with_default(DEFAULT_LEVEL.node_name())
                .one_of(HeadingLevel::ALL.iter().map(|level| level.node_name())),
        );
    if features(NAME, "textAlignment") {
        schema = schema.with(paragraph::align_spec());
    }
    if features(NAME, "anchor") {
        schema = schema.with(AttributeSpec::primitive("anchor", Source::Attribute("id".into())));
    }

    BlockType::new(NAME, "Heading", schema)
        .with_node_level(DEFAULT_LEVEL)
        .with_rich_text(paragraph::rich_text(paragraph::NAME, false, "Heading"))
        .with_supports(Supports {
            class_name: features(NAME, "className"),
            anchor: features(NAME, "anchor"),
            text_alignment: features(NAME, "textAlignment"),
            drop_cap: false,
        })
        .with_transform(TransformRule::from_blocks(
            [paragraph::NAME],
            paragraph::carry_content(NAME),
        ))
        .with_transform(TransformRule::from_pattern(heading_marker(), |input| {
            let level = input
                .capture(1)
                .and_then(|hashes| HeadingLevel::from_number(hashes.len()))
                .unwrap_or(DEFAULT_LEVEL);
            vec![
                BlockSpec::new(NAME)
                    .with(paragraph::CONTENT, input.content.clone())
                    .with(LEVEL, level.node_name()),
            ]
        }))
        .with_transform(TransformRule::to_blocks(
            [paragraph::NAME],
            paragraph::carry_content(paragraph::NAME),
        ))
}

/// Extension rule appended once every built-in is registered.
pub fn lede_extension() -> TransformRule {
    TransformRule::to_blocks([lede::NAME], paragraph::carry_content(lede::NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockName;
    use crate::library::all_features;
    use crate::schema::AttributeValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_to_h2() {
        let heading = block_type(&all_features);
        let spec = heading.schema().spec("nodeName").unwrap();

        assert_eq!(heading.default_node_level(), Some(HeadingLevel::H2));
        assert_eq!(spec.default, Some(AttributeValue::from("H2")));
        assert_eq!(spec.allowed.len(), 6);
    }

    #[test]
    fn anchor_and_alignment_follow_features() {
        let plain = block_type(&|_: &str, _: &str| false);
        assert!(plain.schema().spec("anchor").is_none());
        assert!(plain.schema().spec("align").is_none());

        let full = block_type(&all_features);
        assert_eq!(
            full.schema().spec("anchor").map(|spec| &spec.source),
            Some(&Source::Attribute("id".into()))
        );
        assert!(full.supports().text_alignment);
    }

    #[test]
    fn continuation_is_a_paragraph() {
        let heading = block_type(&all_features);
        let rich_text = heading.rich_text().unwrap();

        assert_eq!(rich_text.continuation, BlockName::from(paragraph::NAME));
        assert!(!rich_text.accepts_patterns);
    }
}
