use crate::block::BlockName;

/// Errors raised by the registry, the transform engine and the split/merge engine.
///
/// All of these are local, synchronous failures reported to the immediate
/// caller. Nothing in the engine retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    #[error("Schema violation in '{block}': {reason}")]
    SchemaViolation { block: BlockName, reason: String },
    #[error("Block type '{0}' is already registered")]
    DuplicateTypeId(BlockName),
    #[error("Unknown block type '{0}'")]
    UnknownType(BlockName),
    #[error("Registry is sealed, cannot {operation}")]
    SealedRegistry { operation: &'static str },
    #[error("No transform rule converts '{from}' into '{to}'")]
    NoMatchingRule { from: BlockName, to: BlockName },
    #[error("Cannot merge '{incoming}' into '{target}': {reason}")]
    IncompatibleMerge {
        target: BlockName,
        incoming: BlockName,
        reason: String,
    },
}

impl BlockError {
    pub(crate) fn schema(block: &BlockName, reason: impl Into<String>) -> Self {
        BlockError::SchemaViolation {
            block: block.clone(),
            reason: reason.into(),
        }
    }
}
