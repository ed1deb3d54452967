//! Crate-level error types.
//!
//! Wire-decoding failures live in [`crate::consensus::encode::Error`] and
//! list-level preconditions in [`crate::sml::error::SmlError`]; the types
//! here cover diff verification and persistence. All of them are recovered
//! at the sync-engine boundary — none escapes to the embedding application
//! as a fault.

use std::io;

use thiserror::Error;

use crate::hash_types::{MerkleRootMasternodeList, MerkleRootQuorums};
use crate::merkle_tree::MerkleProofError;
use crate::sml::quorum_validation_error::QuorumValidationError;

/// A diff failed cryptographic or structural verification. The diff is
/// discarded, the tip does not advance, and the request is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The rebuilt masternode list does not hash to the coinbase commitment.
    #[error(
        "merkle root of masternode list does not match the coinbase commitment (wanted {wanted}, got {got})"
    )]
    MasternodeListRootMismatch {
        /// Root the coinbase payload committed to.
        wanted: MerkleRootMasternodeList,
        /// Root the rebuilt list hashes to.
        got: MerkleRootMasternodeList,
    },

    /// The rebuilt quorum list does not hash to the coinbase commitment.
    #[error(
        "merkle root of quorum list does not match the coinbase commitment (wanted {wanted}, got {got})"
    )]
    QuorumListRootMismatch {
        /// Root the coinbase payload committed to.
        wanted: MerkleRootQuorums,
        /// Root the rebuilt list hashes to.
        got: MerkleRootQuorums,
    },

    /// The diff's transaction is not a coinbase or lacks the coinbase payload.
    #[error("diff transaction is not a coinbase special transaction")]
    MissingCoinbasePayload,

    /// The coinbase transaction predates special-transaction support.
    #[error("coinbase transaction version {0} is below the special-transaction minimum")]
    ProtocolVersionMismatch(u16),

    /// The coinbase transaction is not proven by the diff's Merkle proof.
    #[error("coinbase transaction is not covered by the diff's merkle proof")]
    CoinbaseNotInProof,

    /// The coinbase payload's height contradicts the block the diff targets.
    #[error("coinbase height {coinbase} does not match target block height {block}")]
    CoinbaseHeightMismatch {
        /// Height of the target block per the block source.
        block: u32,
        /// Height the coinbase payload claims.
        coinbase: u32,
    },

    /// The partial Merkle proof itself is malformed.
    #[error("merkle proof invalid: {0}")]
    MerkleProof(#[from] MerkleProofError),

    /// A quorum commitment in the diff is invalid.
    #[error("quorum commitment invalid: {0}")]
    QuorumCommitment(#[from] QuorumValidationError),
}

/// A persistence failure. Durability is at risk, in-memory state is not.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A stored snapshot failed to decode or re-validate.
    #[error("corruption detected: {0}")]
    Corruption(String),
}
