use regex::Regex;

use super::{Candidate, Direction, Matcher, TransformInput, TransformRule};
use crate::block::{BlockInstance, BlockName, BlockType};
use crate::error::BlockError;
use crate::markup::NodeList;
use crate::registry::BlockRegistry;
use crate::schema::AttributeValue;

/// Result of feeding new content into a block being composed.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentChange {
    /// The content was stored; no pattern fired.
    Updated(BlockInstance),
    /// A pattern rule fired and these blocks replace the original.
    Replaced(Vec<BlockInstance>),
}

/// Resolves and applies transform rules against a registry.
#[derive(Debug, Clone, Copy)]
pub struct TransformEngine<'r> {
    registry: &'r BlockRegistry,
}

/// A block-to-block rule that can turn the source into `target`.
struct Route<'r> {
    target: &'r BlockName,
    rule: &'r TransformRule,
}

impl<'r> TransformEngine<'r> {
    pub fn new(registry: &'r BlockRegistry) -> Self {
        Self { registry }
    }

    /// Types this instance can become, in registration order.
    ///
    /// The source's own `To` rules come first, then `From` rules of other
    /// types that name the source. Every listed target is accepted by
    /// [`apply_transform`](Self::apply_transform).
    pub fn available_targets(&self, instance: &BlockInstance) -> Result<Vec<BlockName>, BlockError> {
        let source = self.registry.get(instance.name().as_str())?;
        let mut targets: Vec<BlockName> = Vec::new();
        for route in self.block_routes(source) {
            if !targets.contains(route.target) {
                targets.push(route.target.clone());
            }
        }
        Ok(targets)
    }

    /// Convert `instance` into `target`.
    ///
    /// Block-to-block rules win over pattern rules. Pattern rules of the
    /// target are only consulted when no block rule connects the two types.
    pub fn apply_transform(
        &self,
        instance: &BlockInstance,
        target: &str,
    ) -> Result<Vec<BlockInstance>, BlockError> {
        let source = self.registry.get(instance.name().as_str())?;
        let target_type = self.registry.get(target)?;

        if let Some(route) = self
            .block_routes(source)
            .into_iter()
            .find(|route| route.target == target_type.name())
        {
            log::debug!("Transforming '{}' into '{target}'", source.name());
            let attributes = instance.attributes().clone();
            let input = TransformInput {
                source: source.name().clone(),
                content: source.content_of(&attributes),
                attributes,
                captures: Vec::new(),
            };
            return self.materialize(instance, &input, route.rule);
        }

        for rule in target_type.transforms() {
            if rule.direction() != Direction::From {
                continue;
            }
            if let Matcher::Pattern(regex) = rule.matcher()
                && let Some(input) = pattern_input(source, instance, regex)
            {
                log::debug!("Transforming '{}' into '{target}' by pattern", source.name());
                return self.materialize(instance, &input, rule);
            }
        }

        Err(BlockError::NoMatchingRule {
            from: source.name().clone(),
            to: target_type.name().clone(),
        })
    }

    /// Run the first registered pattern rule matching the instance's text.
    ///
    /// Returns `None` when no pattern matches.
    pub fn apply_patterns(
        &self,
        instance: &BlockInstance,
    ) -> Result<Option<Vec<BlockInstance>>, BlockError> {
        let source = self.registry.get(instance.name().as_str())?;
        let text = source.content_of(instance.attributes()).text();

        for found in self
            .registry
            .rules_matching(Direction::From, Candidate::Text(&text))
        {
            let Matcher::Pattern(regex) = found.rule.matcher() else {
                continue;
            };
            if let Some(input) = pattern_input(source, instance, regex) {
                log::debug!(
                    "Pattern '{}' converts '{}' into '{}'",
                    regex.as_str(),
                    source.name(),
                    found.owner.name()
                );
                return self.materialize(instance, &input, found.rule).map(Some);
            }
        }
        Ok(None)
    }

    /// Store new content for a block being typed into, then fire patterns.
    ///
    /// Conversion is immediate and one-shot; undoing it is up to the host.
    pub fn content_changed(
        &self,
        instance: &BlockInstance,
        content: NodeList,
    ) -> Result<ContentChange, BlockError> {
        let source = self.registry.get(instance.name().as_str())?;
        let Some(attribute) = source.content_attribute() else {
            return Err(BlockError::schema(source.name(), "block has no content attribute"));
        };

        let mut attributes = instance.attributes().clone();
        attributes.insert(attribute.to_string(), AttributeValue::Nodes(content));
        source.schema().validate(source.name(), &attributes)?;
        let updated = instance.with_attributes(attributes);

        let composing = source
            .rich_text()
            .is_some_and(|rich_text| rich_text.accepts_patterns);
        if !composing {
            return Ok(ContentChange::Updated(updated));
        }
        Ok(match self.apply_patterns(&updated)? {
            Some(blocks) => ContentChange::Replaced(blocks),
            None => ContentChange::Updated(updated),
        })
    }

    fn block_routes(&self, source: &'r BlockType) -> Vec<Route<'r>> {
        let mut routes = Vec::new();
        for rule in source.transforms() {
            if rule.direction() != Direction::To {
                continue;
            }
            if let Matcher::Blocks(targets) = rule.matcher() {
                routes.extend(
                    targets
                        .iter()
                        .filter(|target| self.registry.contains(target.as_str()))
                        .map(|target| Route { target, rule }),
                );
            }
        }
        for found in self
            .registry
            .rules_matching(Direction::From, Candidate::Block(source.name()))
            .into_iter()
            .filter(|found| found.owner.name() != source.name())
        {
            routes.push(Route {
                target: found.owner.name(),
                rule: found.rule,
            });
        }
        routes
    }

    fn materialize(
        &self,
        instance: &BlockInstance,
        input: &TransformInput,
        rule: &TransformRule,
    ) -> Result<Vec<BlockInstance>, BlockError> {
        let mut blocks = rule
            .convert(input)
            .into_iter()
            .map(|spec| self.registry.create_block(spec.name.as_str(), spec.attributes))
            .collect::<Result<Vec<_>, _>>()?;

        let source_text = self
            .registry
            .get(input.source.as_str())?
            .text_of(&input.attributes);
        let mut output_text = String::new();
        for block in &blocks {
            output_text.push_str(
                &self
                    .registry
                    .get(block.name().as_str())?
                    .text_of(block.attributes()),
            );
        }
        if output_text != source_text {
            log::warn!(
                "Transform of '{}' did not preserve content: {source_text:?} became {output_text:?}",
                input.source
            );
        }

        if let Some(first) = blocks.first_mut() {
            // Converting into the source's own type edits the block in place.
            if first.name() == instance.name() {
                *first = instance.with_attributes(first.attributes().clone());
            }
            first.set_selected(instance.is_selected());
        }
        Ok(blocks)
    }
}

/// Build the input for a pattern rule, with the matched marker removed.
fn pattern_input(
    source: &BlockType,
    instance: &BlockInstance,
    regex: &Regex,
) -> Option<TransformInput> {
    let content = source.content_of(instance.attributes());
    let text = content.text();
    let captures = regex.captures(&text)?;
    let whole = captures.get(0)?;

    let start = text[..whole.start()].chars().count();
    let len = whole.as_str().chars().count();
    let (head, rest) = content.split_at(start);
    let (_, tail) = rest.split_at(len);
    let stripped = head.concat(&tail);

    let mut attributes = instance.attributes().clone();
    if let Some(name) = source.content_attribute() {
        attributes.insert(name.to_string(), AttributeValue::Nodes(stripped.clone()));
    }
    Some(TransformInput {
        source: source.name().clone(),
        attributes,
        content: stripped,
        captures: captures
            .iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect(),
    })
}
