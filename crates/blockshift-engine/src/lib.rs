pub mod block;
pub mod editing;
pub mod error;
pub mod library;
pub mod markup;
pub mod registry;
pub mod schema;
pub mod transform;

// Re-export key types for easier usage
pub use block::{BlockInstance, BlockName, BlockType, ClientId, HeadingLevel, RichText, Supports};
pub use editing::{Merged, Removal, Replacement, SplitMergeEngine};
pub use error::BlockError;
pub use library::{FeatureFlags, all_features, builtin_registry, register_builtins};
pub use markup::{Element, MarkupError, Node, NodeList, parse_fragment};
pub use registry::{BlockRegistry, RuleMatch};
pub use schema::{
    AttributeKind, AttributeSchema, AttributeSpec, AttributeValue, Attributes, RootShape, Selector,
    Source, TagRule,
};
pub use transform::{
    BlockSpec, Candidate, ContentChange, Direction, Matcher, TransformEngine, TransformInput,
    TransformRule,
};
