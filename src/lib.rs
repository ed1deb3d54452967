//! Masternode-list differential synchronization.
//!
//! This crate keeps a node's view of the deterministic masternode set (and,
//! transitively, its quorum commitments) converged with the network by
//! applying incremental diffs received from peers. Each diff is verified
//! against the Merkle commitments in the target block's coinbase payload
//! before anything is committed; unverifiable diffs are dropped and
//! re-requested with bounded retries.
//!
//! The pieces:
//!
//! - [`consensus`] — the deterministic binary codec everything rides on.
//! - [`sml`] — the domain model: list entries, the list with its uniqueness
//!   index and Merkle root, quorum commitments, deterministic scoring.
//! - [`network`] — the `GetMnListDiff`/`MnListDiff` message pair.
//! - [`sync`] — the request-pacing engine and the atomic diff transition.
//! - [`storage`] — snapshot persistence.
//!
//! The blockchain, the peer transport and the coinbase decoder are external
//! collaborators: the engine consumes block handles, decoded diffs, and a
//! dispatch callback, nothing more.

pub mod bls_sig_utils;
pub mod consensus;
pub mod error;
pub mod hash_types;
mod internal_macros;
pub mod merkle_tree;
pub mod network;
pub mod sml;
pub mod storage;
pub mod sync;
pub mod transaction;

pub use crate::error::{StorageError, VerificationError};
pub use crate::hash_types::{
    BlockHash, ConfirmedHash, MerkleRootMasternodeList, MerkleRootQuorums, ProTxHash, PubkeyHash,
    QuorumHash, QuorumModifierHash, ScoreHash, Txid,
};
pub use crate::network::message_sml::{GetMnListDiff, MnListDiff};
pub use crate::sml::llmq_type::LLMQType;
pub use crate::sml::masternode_list::MasternodeList;
pub use crate::sml::masternode_list_entry::MasternodeListEntry;
pub use crate::sml::quorum_list::QuorumList;
pub use crate::storage::{FileSnapshotStore, ManagerSnapshot, MemorySnapshotStore, SnapshotStore};
pub use crate::sync::config::SyncConfig;
pub use crate::sync::manager::{MasternodeSyncManager, SyncPhase, SyncStats};
pub use crate::sync::{BlockInfo, ChainTipSource, DispatchError, PeerDispatch};
