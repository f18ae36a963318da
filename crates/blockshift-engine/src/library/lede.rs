//! `blockshift/lede-copy`: an introductory paragraph stored as
//! `<p class="o-lede">`, optionally with a drop cap.

use super::{FeatureFlags, heading, heading_marker, paragraph};
use crate::block::{BlockType, Supports};
use crate::schema::{AttributeSchema, RootShape};
use crate::transform::TransformRule;

pub const NAME: &str = "blockshift/lede-copy";

pub fn block_type(features: FeatureFlags<'_>) -> BlockType {
    let drop_cap = features(NAME, "dropCap");
    let mut schema = AttributeSchema::new(RootShape::element("p").with_class("o-lede"))
        .with(paragraph::content_spec());
    if drop_cap {
        schema = schema.with(paragraph::drop_cap_spec("o-dropcap"));
    }

    let typed_marker = if drop_cap {
        TransformRule::from_pattern(
            heading_marker(),
            paragraph::carry_content_and_drop_cap(NAME),
        )
    } else {
        TransformRule::from_pattern(heading_marker(), paragraph::carry_content(NAME))
    };

    BlockType::new(NAME, "Lede Copy", schema)
        .with_rich_text(paragraph::rich_text(paragraph::NAME, true, "Write the lede"))
        .with_supports(Supports {
            drop_cap,
            ..Supports::default()
        })
        .with_transform(TransformRule::from_blocks(
            [paragraph::NAME],
            paragraph::carry_content(NAME),
        ))
        .with_transform(typed_marker)
        .with_transform(TransformRule::to_blocks(
            [paragraph::NAME],
            paragraph::carry_content_and_drop_cap(paragraph::NAME),
        ))
        .with_transform(TransformRule::to_blocks(
            [heading::NAME],
            paragraph::carry_content(heading::NAME),
        ))
}
