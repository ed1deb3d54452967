//! The synchronization engine: the pure diff-transition function and the
//! stateful manager that paces requests against peers.

pub mod config;
pub mod manager;
pub mod transition;

use thiserror::Error;

use crate::hash_types::BlockHash;
use crate::network::message_sml::GetMnListDiff;

/// The block handle the engine works with. Supplied by the embedding
/// application's header chain.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct BlockInfo {
    /// The block's hash.
    pub hash: BlockHash,
    /// The block's height.
    pub height: u32,
}

/// Where the engine learns the current best block from.
pub trait ChainTipSource {
    /// The current best block, if a chain is known at all.
    fn chain_tip(&self) -> Option<BlockInfo>;
}

/// How the engine sends a diff request to the network.
///
/// Implementations pick the peer; the engine only cares that exactly one
/// outstanding request exists at a time. The engine never holds its state
/// lock across this call.
pub trait PeerDispatch {
    /// Sends a diff request to a connected peer.
    fn send_get_diff(&self, request: GetMnListDiff) -> Result<(), DispatchError>;
}

/// A request could not be handed to the transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("peer dispatch failed: {0}")]
pub struct DispatchError(pub String);

impl<T: ChainTipSource + ?Sized> ChainTipSource for std::sync::Arc<T> {
    fn chain_tip(&self) -> Option<BlockInfo> {
        (**self).chain_tip()
    }
}

impl<T: PeerDispatch + ?Sized> PeerDispatch for std::sync::Arc<T> {
    fn send_get_diff(&self, request: GetMnListDiff) -> Result<(), DispatchError> {
        (**self).send_get_diff(request)
    }
}
