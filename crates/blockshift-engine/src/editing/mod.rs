/*!
 * # Editing Gestures
 *
 * Split, merge, remove and replace, expressed as pure operations over block
 * instances. The host translates a UI event (Enter, Backspace at the start
 * of a block, drag-drop) into one call here and swaps the returned values
 * into its own state. Nothing in this module holds on to instances or calls
 * back into the host.
 *
 * ## Content Preservation
 *
 * - **Split**: `before`, then the text of every extra block, then `after`
 *   must equal the original content, and `split` rejects pieces that do
 *   not. [`SplitMergeEngine::split_at`] builds
 *   `before`/`after` from a character offset so the property holds.
 * - **Merge**: the merged content is `target` followed by `incoming`; every
 *   other attribute comes from `target`.
 *
 * ## Focus
 *
 * After a split the continuation block carries the split block's `selected`
 * flag and the updated original is deselected, so the caret follows the
 * text after the cursor.
 */

use crate::block::{BlockInstance, BlockType, ClientId};
use crate::error::BlockError;
use crate::markup::NodeList;
use crate::registry::BlockRegistry;
use crate::schema::{AttributeKind, AttributeValue, Attributes};

/// Outcome of a merge: the updated target and the id of the block to drop.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub block: BlockInstance,
    pub discarded: ClientId,
}

/// Notification that a block should be deleted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub client_id: ClientId,
}

/// Notification that a block should be swapped for zero or more blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub replaced: ClientId,
    pub blocks: Vec<BlockInstance>,
}

#[derive(Debug, Clone, Copy)]
pub struct SplitMergeEngine<'r> {
    registry: &'r BlockRegistry,
}

impl<'r> SplitMergeEngine<'r> {
    pub fn new(registry: &'r BlockRegistry) -> Self {
        Self { registry }
    }

    /// Split `instance` into itself (holding `before`), the `extras`, and a
    /// new continuation block holding `after`.
    ///
    /// `before`, the extras' content and `after` must add up to the original
    /// content; anything else is a `SchemaViolation`.
    pub fn split(
        &self,
        instance: &BlockInstance,
        before: NodeList,
        after: NodeList,
        extras: Vec<BlockInstance>,
    ) -> Result<Vec<BlockInstance>, BlockError> {
        let block_type = self.registry.get(instance.name().as_str())?;
        let Some(rich_text) = block_type.rich_text() else {
            return Err(BlockError::schema(
                block_type.name(),
                "block does not support splitting",
            ));
        };
        let content = content_attribute(block_type)?;

        let mut rebuilt = before.clone();
        for extra in &extras {
            let extra_type = self.registry.get(extra.name().as_str())?;
            rebuilt = rebuilt.concat(&extra_type.content_of(extra.attributes()));
        }
        rebuilt = rebuilt.concat(&after);
        let original = block_type.content_of(instance.attributes());
        if rebuilt != original {
            return Err(BlockError::schema(
                block_type.name(),
                format!(
                    "split pieces {:?} do not add up to the original content {:?}",
                    rebuilt.text(),
                    original.text()
                ),
            ));
        }

        let mut attributes = instance.attributes().clone();
        attributes.insert(content.to_string(), AttributeValue::Nodes(before));
        block_type
            .schema()
            .validate(block_type.name(), &attributes)?;
        let head = instance.with_attributes(attributes).with_selected(false);

        let continuation_type = self.registry.get(rich_text.continuation.as_str())?;
        let continuation_content = content_attribute(continuation_type)?;
        let mut continuation_attributes = Attributes::new();
        continuation_attributes.insert(
            continuation_content.to_string(),
            AttributeValue::Nodes(after),
        );
        let tail = self
            .registry
            .create_block(continuation_type.name().as_str(), continuation_attributes)?
            .with_selected(instance.is_selected());

        log::debug!(
            "Split '{}' into {} block(s)",
            instance.name(),
            extras.len() + 2
        );
        let mut blocks = Vec::with_capacity(extras.len() + 2);
        blocks.push(head);
        blocks.extend(extras);
        blocks.push(tail);
        Ok(blocks)
    }

    /// Split at a character offset into the block's plain-text content.
    pub fn split_at(
        &self,
        instance: &BlockInstance,
        offset: usize,
    ) -> Result<Vec<BlockInstance>, BlockError> {
        let block_type = self.registry.get(instance.name().as_str())?;
        let content = block_type.content_of(instance.attributes());
        if offset > content.text_len() {
            return Err(BlockError::schema(
                block_type.name(),
                format!(
                    "split offset {offset} is beyond the content length {}",
                    content.text_len()
                ),
            ));
        }
        let (before, after) = content.split_at(offset);
        self.split(instance, before, after, Vec::new())
    }

    /// Append `incoming`'s content to `target`'s. `target` keeps its identity
    /// and every other attribute.
    pub fn merge(
        &self,
        target: &BlockInstance,
        incoming: &BlockInstance,
    ) -> Result<Merged, BlockError> {
        let target_type = self.registry.get(target.name().as_str())?;
        let incoming_type = self.registry.get(incoming.name().as_str())?;
        let incompatible = |reason: &str| BlockError::IncompatibleMerge {
            target: target_type.name().clone(),
            incoming: incoming_type.name().clone(),
            reason: reason.to_string(),
        };

        let target_content = node_list_attribute(target_type)
            .ok_or_else(|| incompatible("target has no node-list content"))?;
        let incoming_content = node_list_attribute(incoming_type)
            .ok_or_else(|| incompatible("incoming block has no node-list content"))?;

        let merged = target_type
            .content_of(target.attributes())
            .concat(&incoming_type.content_of(incoming.attributes()));
        let mut attributes = target.attributes().clone();
        attributes.insert(target_content.to_string(), AttributeValue::Nodes(merged));
        target_type
            .schema()
            .validate(target_type.name(), &attributes)?;

        log::debug!(
            "Merged '{}' ({incoming_content}) into '{}' ({target_content})",
            incoming.name(),
            target.name()
        );
        Ok(Merged {
            block: target.with_attributes(attributes),
            discarded: incoming.client_id(),
        })
    }

    pub fn remove(&self, instance: &BlockInstance) -> Removal {
        log::debug!("Removing '{}' ({})", instance.name(), instance.client_id());
        Removal {
            client_id: instance.client_id(),
        }
    }

    pub fn replace(&self, instance: &BlockInstance, blocks: Vec<BlockInstance>) -> Replacement {
        log::debug!(
            "Replacing '{}' with {} block(s)",
            instance.name(),
            blocks.len()
        );
        Replacement {
            replaced: instance.client_id(),
            blocks,
        }
    }
}

fn node_list_attribute(block_type: &BlockType) -> Option<&str> {
    let name = block_type.content_attribute()?;
    let spec = block_type.schema().spec(name)?;
    (spec.kind == AttributeKind::NodeList).then_some(name)
}

fn content_attribute(block_type: &BlockType) -> Result<&str, BlockError> {
    node_list_attribute(block_type).ok_or_else(|| {
        BlockError::schema(block_type.name(), "block has no node-list content attribute")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockType, RichText};
    use crate::schema::{AttributeSchema, AttributeSpec, RootShape};
    use pretty_assertions::assert_eq;

    fn rich_text(continuation: &str) -> RichText {
        RichText {
            content: "content".into(),
            continuation: continuation.into(),
            accepts_patterns: true,
            placeholder: String::new(),
        }
    }

    fn registry() -> BlockRegistry {
        let mut registry = BlockRegistry::new();
        registry
            .register(
                BlockType::new(
                    "paragraph",
                    "Paragraph",
                    AttributeSchema::new(RootShape::element("p"))
                        .with(AttributeSpec::node_list("content"))
                        .with(AttributeSpec::flag("dropCap", "has-drop-cap")),
                )
                .with_rich_text(rich_text("paragraph")),
            )
            .unwrap();
        registry
            .register(
                BlockType::new(
                    "heading",
                    "Heading",
                    AttributeSchema::new(RootShape::element("h2"))
                        .with(AttributeSpec::node_list("content")),
                )
                .with_rich_text(rich_text("paragraph")),
            )
            .unwrap();
        registry
            .register(BlockType::new(
                "separator",
                "Separator",
                AttributeSchema::new(RootShape::element("hr"))
                    .with(AttributeSpec::flag("wide", "is-wide")),
            ))
            .unwrap();
        registry
    }

    fn block(registry: &BlockRegistry, name: &str, text: &str) -> BlockInstance {
        let mut attributes = Attributes::new();
        attributes.insert("content".into(), NodeList::from_text(text).into());
        registry.create_block(name, attributes).unwrap()
    }

    fn content(block: &BlockInstance) -> String {
        block.attribute("content").unwrap().as_nodes().unwrap().text()
    }

    #[test]
    fn split_keeps_identity_and_moves_focus() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let original = block(&registry, "heading", "ABCD").with_selected(true);

        let blocks = engine.split_at(&original, 2).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].client_id(), original.client_id());
        assert_eq!(blocks[0].name().as_str(), "heading");
        assert!(!blocks[0].is_selected());
        assert_eq!(blocks[1].name().as_str(), "paragraph");
        assert!(blocks[1].is_selected());
        assert_eq!(content(&blocks[0]), "AB");
        assert_eq!(content(&blocks[1]), "CD");
    }

    #[test]
    fn split_places_extras_between() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let original = block(&registry, "paragraph", "AB-CD");
        let pasted = block(&registry, "heading", "-");

        let blocks = engine
            .split(&original, "AB".into(), "CD".into(), vec![pasted.clone()])
            .unwrap();

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1], pasted);
        let joined: String = blocks.iter().map(content).collect();
        assert_eq!(joined, "AB-CD");
    }

    #[test]
    fn split_rejects_pieces_that_lose_text() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let original = block(&registry, "paragraph", "ABCD");

        assert!(matches!(
            engine.split(&original, "XX".into(), "YY".into(), Vec::new()),
            Err(BlockError::SchemaViolation { .. })
        ));
        assert!(matches!(
            engine.split(&original, "AB".into(), "D".into(), Vec::new()),
            Err(BlockError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn split_rejects_extras_that_duplicate_text() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let original = block(&registry, "paragraph", "AB-CD");
        let pasted = block(&registry, "heading", "-CD");

        assert!(matches!(
            engine.split(&original, "AB".into(), "CD".into(), vec![pasted]),
            Err(BlockError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn split_keeps_other_attributes_on_the_original() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let mut attributes = Attributes::new();
        attributes.insert("content".into(), NodeList::from_text("ABCD").into());
        attributes.insert("dropCap".into(), true.into());
        let original = registry.create_block("paragraph", attributes).unwrap();

        let blocks = engine.split_at(&original, 1).unwrap();
        assert_eq!(blocks[0].attribute("dropCap"), Some(&AttributeValue::Flag(true)));
        assert_eq!(blocks[1].attribute("dropCap"), Some(&AttributeValue::Flag(false)));
    }

    #[test]
    fn split_beyond_content_is_rejected() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let original = block(&registry, "paragraph", "AB");

        assert!(matches!(
            engine.split_at(&original, 3),
            Err(BlockError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn split_requires_rich_text() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let separator = registry.create_block("separator", Attributes::new()).unwrap();

        assert!(matches!(
            engine.split(&separator, NodeList::empty(), NodeList::empty(), Vec::new()),
            Err(BlockError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn merge_concatenates_target_then_incoming() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let target = block(&registry, "heading", "Foo");
        let incoming = block(&registry, "paragraph", "Bar");

        let merged = engine.merge(&target, &incoming).unwrap();

        assert_eq!(content(&merged.block), "FooBar");
        assert_eq!(merged.block.client_id(), target.client_id());
        assert_eq!(merged.block.name().as_str(), "heading");
        assert_eq!(merged.discarded, incoming.client_id());
    }

    #[test]
    fn merge_rejects_blocks_without_node_list_content() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let paragraph = block(&registry, "paragraph", "Foo");
        let separator = registry.create_block("separator", Attributes::new()).unwrap();

        assert!(matches!(
            engine.merge(&paragraph, &separator),
            Err(BlockError::IncompatibleMerge { .. })
        ));
        assert!(matches!(
            engine.merge(&separator, &paragraph),
            Err(BlockError::IncompatibleMerge { .. })
        ));
    }

    #[test]
    fn split_then_merge_restores_content() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let original = block(&registry, "paragraph", "Hello world");

        for offset in 0..=11 {
            let blocks = engine.split_at(&original, offset).unwrap();
            let merged = engine.merge(&blocks[0], &blocks[1]).unwrap();
            assert_eq!(
                merged.block.attribute("content"),
                original.attribute("content"),
                "offset {offset}"
            );
        }
    }

    #[test]
    fn remove_and_replace_only_describe_the_change() {
        let registry = registry();
        let engine = SplitMergeEngine::new(&registry);
        let original = block(&registry, "paragraph", "x");
        let other = block(&registry, "heading", "y");

        assert_eq!(
            engine.remove(&original),
            Removal {
                client_id: original.client_id()
            }
        );
        let replacement = engine.replace(&original, vec![other.clone()]);
        assert_eq!(replacement.replaced, original.client_id());
        assert_eq!(replacement.blocks, vec![other]);
    }
}
