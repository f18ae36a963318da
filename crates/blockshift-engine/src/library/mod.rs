//! Built-in block types.
//!
//! `core/paragraph` supplies the paragraph-like editing behaviour (content
//! attribute, rich text, drop cap) that `core/heading` and
//! `blockshift/lede-copy` reuse by calling into [`paragraph`], rather than by
//! copying or overriding a full paragraph definition.

pub mod heading;
pub mod lede;
pub mod paragraph;

use std::sync::OnceLock;

use regex::Regex;

use crate::error::BlockError;
use crate::registry::BlockRegistry;

/// Answers whether `feature` is enabled for the block type `block`.
pub type FeatureFlags<'a> = &'a dyn Fn(&str, &str) -> bool;

/// Every feature enabled.
pub fn all_features(_block: &str, _feature: &str) -> bool {
    true
}

/// Leading Markdown-style heading marker typed into a paragraph, e.g. `## `.
pub(crate) fn heading_marker() -> Regex {
    static HEADING_MARKER: OnceLock<Regex> = OnceLock::new();
    HEADING_MARKER
        .get_or_init(|| Regex::new(r"^(#{2,6})\s").expect("Invalid heading marker regex"))
        .clone()
}

/// Register the built-in types on an open registry.
///
/// Registration order decides which pattern rule fires first, so the lede
/// is registered ahead of the heading.
pub fn register_builtins(
    registry: &mut BlockRegistry,
    features: FeatureFlags<'_>,
) -> Result<(), BlockError> {
    registry.register(paragraph::block_type(features))?;
    registry.register(lede::block_type(features))?;
    registry.register(heading::block_type(features))?;
    registry.append_transform_rule(heading::NAME, heading::lede_extension())?;
    Ok(())
}

/// A sealed registry holding only the built-in types.
pub fn builtin_registry(features: FeatureFlags<'_>) -> Result<BlockRegistry, BlockError> {
    let mut registry = BlockRegistry::new();
    register_builtins(&mut registry, features)?;
    registry.seal();
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtins_register_in_order() {
        let registry = builtin_registry(&all_features).unwrap();
        let names: Vec<&str> = registry.types().map(|t| t.name().as_str()).collect();

        assert!(registry.is_sealed());
        assert_eq!(names, vec![paragraph::NAME, lede::NAME, heading::NAME]);
    }

    #[test]
    fn heading_carries_the_lede_extension() {
        let registry = builtin_registry(&all_features).unwrap();
        let heading = registry.get(heading::NAME).unwrap();
        assert_eq!(heading.transforms().len(), 4);
    }

    #[test]
    fn heading_marker_needs_two_to_six_hashes() {
        let marker = heading_marker();
        assert!(marker.is_match("## Title"));
        assert!(marker.is_match("###### Title"));
        assert!(!marker.is_match("# Title"));
        assert!(!marker.is_match("####### Title"));
        assert!(!marker.is_match("##Title"));
    }
}
