use std::collections::HashMap;
use std::sync::Arc;

use crate::block::{BlockInstance, BlockName, BlockType};
use crate::error::BlockError;
use crate::markup::{Element, Node, parse_fragment};
use crate::schema::{Attributes, single_root};
use crate::transform::{Candidate, Direction, TransformRule};

/// A rule together with the block type that owns it.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'r> {
    pub owner: &'r BlockType,
    pub rule: &'r TransformRule,
}

/// Process-wide table of block types.
///
/// The registry has two phases. While open, types are registered and
/// extensions may append transform rules to existing types. After [`seal`]
/// it is read-only: every mutating call fails with `SealedRegistry`, and the
/// registry can be shared across threads via [`into_shared`].
///
/// Mutation requires `&mut self`, so rules cannot change underneath an
/// active reader.
///
/// [`seal`]: BlockRegistry::seal
/// [`into_shared`]: BlockRegistry::into_shared
#[derive(Debug, Default)]
pub struct BlockRegistry {
    types: Vec<BlockType>,
    index: HashMap<BlockName, usize>,
    sealed: bool,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, block_type: BlockType) -> Result<(), BlockError> {
        self.ensure_open("register a block type")?;
        if self.index.contains_key(block_type.name()) {
            return Err(BlockError::DuplicateTypeId(block_type.name().clone()));
        }
        block_type.schema().check(block_type.name())?;

        log::debug!(
            "Registered block type '{}' with {} transform rule(s)",
            block_type.name(),
            block_type.transforms().len()
        );
        self.index
            .insert(block_type.name().clone(), self.types.len());
        self.types.push(block_type);
        Ok(())
    }

    /// Add a rule to an already registered type's rule set.
    pub fn append_transform_rule(
        &mut self,
        name: &str,
        rule: TransformRule,
    ) -> Result<(), BlockError> {
        self.ensure_open("append a transform rule")?;
        let position = *self
            .index
            .get(name)
            .ok_or_else(|| BlockError::UnknownType(name.into()))?;
        log::debug!("Appended {:?} rule to '{name}'", rule.direction());
        self.types[position].transforms.push(rule);
        Ok(())
    }

    /// Freeze the registry. Idempotent.
    pub fn seal(&mut self) {
        if !self.sealed {
            log::debug!("Sealed block registry with {} type(s)", self.types.len());
        }
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Seal and wrap for sharing between read-only consumers.
    pub fn into_shared(mut self) -> Arc<BlockRegistry> {
        self.seal();
        Arc::new(self)
    }

    pub fn get(&self, name: &str) -> Result<&BlockType, BlockError> {
        self.index
            .get(name)
            .map(|&position| &self.types[position])
            .ok_or_else(|| BlockError::UnknownType(name.into()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &BlockType> {
        self.types.iter()
    }

    /// Every `(owner, rule)` pair in `direction` whose matcher accepts
    /// `candidate`, in registration order.
    pub fn rules_matching(&self, direction: Direction, candidate: Candidate<'_>) -> Vec<RuleMatch<'_>> {
        self.types
            .iter()
            .flat_map(|owner| {
                owner
                    .transforms()
                    .iter()
                    .filter(move |rule| {
                        rule.direction() == direction && rule.matcher().matches(candidate)
                    })
                    .map(move |rule| RuleMatch { owner, rule })
            })
            .collect()
    }

    /// Build a new instance with defaults filled in and the schema enforced.
    pub fn create_block(
        &self,
        name: &str,
        attributes: Attributes,
    ) -> Result<BlockInstance, BlockError> {
        let block_type = self.get(name)?;
        block_type
            .schema()
            .validate(block_type.name(), &attributes)?;
        let attributes = block_type.schema().with_defaults(&attributes);
        Ok(BlockInstance::new(block_type.name().clone(), attributes))
    }

    /// Apply attribute changes to an instance, keeping its identity.
    pub fn update_attributes(
        &self,
        instance: &BlockInstance,
        changes: Attributes,
    ) -> Result<BlockInstance, BlockError> {
        let block_type = self.get(instance.name().as_str())?;
        let mut attributes = instance.attributes().clone();
        attributes.extend(changes);
        block_type
            .schema()
            .validate(block_type.name(), &attributes)?;
        Ok(instance.with_attributes(attributes))
    }

    /// Deserialize an instance of `name` from its stored markup.
    pub fn extract(&self, name: &str, markup: &str) -> Result<BlockInstance, BlockError> {
        let block_type = self.get(name)?;
        let attributes = block_type.schema().extract(block_type.name(), markup)?;
        Ok(BlockInstance::new(block_type.name().clone(), attributes))
    }

    pub fn serialize(&self, instance: &BlockInstance) -> Result<String, BlockError> {
        let block_type = self.get(instance.name().as_str())?;
        block_type
            .schema()
            .serialize(block_type.name(), instance.attributes())
    }

    /// Deserialize markup as the first registered type whose schema accepts it.
    pub fn parse_block(&self, markup: &str) -> Result<BlockInstance, BlockError> {
        let unknown = BlockName::from("unknown");
        let nodes =
            parse_fragment(markup).map_err(|err| BlockError::schema(&unknown, err.to_string()))?;
        let element = single_root(&unknown, nodes)?;
        self.detect(&element)
    }

    /// Parse a document made of consecutive top-level block elements.
    pub fn parse_document(&self, markup: &str) -> Result<Vec<BlockInstance>, BlockError> {
        let unknown = BlockName::from("unknown");
        let nodes =
            parse_fragment(markup).map_err(|err| BlockError::schema(&unknown, err.to_string()))?;

        let mut blocks = Vec::new();
        for node in nodes {
            match node {
                Node::Text(text) if text.trim().is_empty() => {}
                Node::Text(text) => {
                    return Err(BlockError::schema(
                        &unknown,
                        format!("unexpected text between blocks: '{}'", text.trim()),
                    ));
                }
                Node::Element(element) => blocks.push(self.detect(&element)?),
            }
        }
        log::debug!("Parsed document into {} block(s)", blocks.len());
        Ok(blocks)
    }

    /// Serialize blocks one per paragraph, separated by a blank line.
    pub fn serialize_document(&self, blocks: &[BlockInstance]) -> Result<String, BlockError> {
        let parts = blocks
            .iter()
            .map(|block| self.serialize(block))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join("\n\n"))
    }

    fn detect(&self, element: &Element) -> Result<BlockInstance, BlockError> {
        for block_type in &self.types {
            if let Ok(attributes) = block_type
                .schema()
                .extract_element(block_type.name(), element)
            {
                return Ok(BlockInstance::new(block_type.name().clone(), attributes));
            }
        }
        Err(BlockError::schema(
            &BlockName::from("unknown"),
            format!("no registered block type accepts <{}>", element.tag),
        ))
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), BlockError> {
        if self.sealed {
            return Err(BlockError::SealedRegistry { operation });
        }
        Ok(())
    }
}
