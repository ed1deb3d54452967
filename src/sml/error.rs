use thiserror::Error;

use crate::hash_types::BlockHash;

/// Errors raised by list-level operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SmlError {
    /// The diff's base block hash does not match the list it was applied to.
    /// Expected under duplicate or out-of-order delivery; callers treat this
    /// as "stale diff, ignore".
    #[error("base block hash mismatch: expected {expected}, but found {found}")]
    BaseBlockHashMismatch {
        /// The hash the list is anchored to.
        expected: BlockHash,
        /// The base hash the diff claimed.
        found: BlockHash,
    },
}
