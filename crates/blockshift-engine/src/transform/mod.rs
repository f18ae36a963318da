//! # Transform Rules
//!
//! Directed conversions between block types, or from a typed text pattern
//! into a block type. Rules are owned by a block type: a `To` rule converts
//! the owner into the listed blocks, a `From` rule converts the listed blocks
//! (or matching text) into the owner.
//!
//! [`TransformEngine`] resolves and applies them.

mod engine;

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::block::BlockName;
use crate::markup::NodeList;
use crate::schema::{AttributeValue, Attributes};

pub use engine::{ContentChange, TransformEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    To,
    From,
}

#[derive(Debug, Clone)]
pub enum Matcher {
    /// Explicit block-to-block conversion.
    Blocks(Vec<BlockName>),
    /// Text typed into a composing block, e.g. `^(#{2,6})\s`.
    Pattern(Regex),
}

/// What a rule is being asked to match.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    Block(&'a BlockName),
    Text(&'a str),
}

impl Matcher {
    pub fn matches(&self, candidate: Candidate<'_>) -> bool {
        match (self, candidate) {
            (Matcher::Blocks(names), Candidate::Block(name)) => names.contains(name),
            (Matcher::Pattern(regex), Candidate::Text(text)) => regex.is_match(text),
            _ => false,
        }
    }
}

/// Input handed to a rule's `convert`.
#[derive(Debug, Clone)]
pub struct TransformInput {
    pub source: BlockName,
    pub attributes: Attributes,
    /// The source's content attribute. For pattern rules the matched marker
    /// has already been removed.
    pub content: NodeList,
    /// Regex capture groups for pattern rules, group 0 first.
    pub captures: Vec<Option<String>>,
}

impl TransformInput {
    pub fn capture(&self, group: usize) -> Option<&str> {
        self.captures.get(group)?.as_deref()
    }
}

/// A block to create from a transform: a type name and its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpec {
    pub name: BlockName,
    pub attributes: Attributes,
}

impl BlockSpec {
    pub fn new(name: impl Into<BlockName>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with(mut self, attribute: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(attribute.to_string(), value.into());
        self
    }
}

type ConvertFn = dyn Fn(&TransformInput) -> Vec<BlockSpec> + Send + Sync;

/// A directed conversion rule with a pure `convert` function.
///
/// `convert` must preserve the text of the source's node-list attributes
/// across its outputs, apart from a consumed pattern marker.
#[derive(Clone)]
pub struct TransformRule {
    direction: Direction,
    matcher: Matcher,
    convert: Arc<ConvertFn>,
}

impl TransformRule {
    pub fn new<F>(direction: Direction, matcher: Matcher, convert: F) -> Self
    where
        F: Fn(&TransformInput) -> Vec<BlockSpec> + Send + Sync + 'static,
    {
        Self {
            direction,
            matcher,
            convert: Arc::new(convert),
        }
    }

    pub fn to_blocks<I, N, F>(targets: I, convert: F) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<BlockName>,
        F: Fn(&TransformInput) -> Vec<BlockSpec> + Send + Sync + 'static,
    {
        let targets = targets.into_iter().map(Into::into).collect();
        Self::new(Direction::To, Matcher::Blocks(targets), convert)
    }

    pub fn from_blocks<I, N, F>(sources: I, convert: F) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<BlockName>,
        F: Fn(&TransformInput) -> Vec<BlockSpec> + Send + Sync + 'static,
    {
        let sources = sources.into_iter().map(Into::into).collect();
        Self::new(Direction::From, Matcher::Blocks(sources), convert)
    }

    pub fn from_pattern<F>(pattern: Regex, convert: F) -> Self
    where
        F: Fn(&TransformInput) -> Vec<BlockSpec> + Send + Sync + 'static,
    {
        Self::new(Direction::From, Matcher::Pattern(pattern), convert)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn convert(&self, input: &TransformInput) -> Vec<BlockSpec> {
        (self.convert)(input)
    }
}

impl fmt::Debug for TransformRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRule")
            .field("direction", &self.direction)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}
