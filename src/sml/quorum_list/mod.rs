mod apply_diff;

use std::collections::BTreeMap;

use hashes::Hash;

use crate::error::VerificationError;
use crate::hash_types::{MerkleRootQuorums, QuorumHash};
use crate::sml::llmq_type::LLMQType;
use crate::sml::masternode_list::{MasternodeList, merkle_root_from_hashes};
use crate::sml::quorum_entry::QuorumEntry;
use crate::sml::quorum_entry::qualified_quorum_entry::QualifiedQuorumEntry;
use crate::transaction::coinbase::CoinbasePayload;

/// The active quorum commitments at one chain position, advanced in lockstep
/// with the masternode list.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct QuorumList {
    quorums: BTreeMap<LLMQType, BTreeMap<QuorumHash, QualifiedQuorumEntry>>,
}

impl QuorumList {
    /// The empty quorum list.
    pub fn empty() -> Self {
        QuorumList::default()
    }

    /// All commitments, grouped by quorum class.
    pub fn quorums(&self) -> &BTreeMap<LLMQType, BTreeMap<QuorumHash, QualifiedQuorumEntry>> {
        &self.quorums
    }

    /// Total number of tracked commitments.
    pub fn len(&self) -> usize {
        self.quorums.values().map(BTreeMap::len).sum()
    }

    /// Whether no commitments are tracked.
    pub fn is_empty(&self) -> bool {
        self.quorums.is_empty()
    }

    /// Looks up one commitment.
    pub fn quorum(
        &self,
        llmq_type: LLMQType,
        quorum_hash: &QuorumHash,
    ) -> Option<&QualifiedQuorumEntry> {
        self.quorums.get(&llmq_type)?.get(quorum_hash)
    }

    pub(crate) fn insert(&mut self, llmq_type: LLMQType, entry: QuorumEntry) {
        self.quorums
            .entry(llmq_type)
            .or_default()
            .insert(entry.quorum_hash, QualifiedQuorumEntry::from(entry));
    }

    pub(crate) fn remove(&mut self, llmq_type: LLMQType, quorum_hash: &QuorumHash) {
        if let Some(class) = self.quorums.get_mut(&llmq_type) {
            class.remove(quorum_hash);
            if class.is_empty() {
                self.quorums.remove(&llmq_type);
            }
        }
    }

    /// Every commitment, flattened.
    pub fn iter(&self) -> impl Iterator<Item = &QualifiedQuorumEntry> {
        self.quorums.values().flat_map(BTreeMap::values)
    }

    /// The Merkle root over all commitment entry hashes, sorted ascending, or
    /// `None` when no quorums are tracked.
    pub fn calculate_merkle_root(&self) -> Option<MerkleRootQuorums> {
        let mut hashes: Vec<[u8; 32]> = self.iter().map(|entry| entry.entry_hash).collect();
        hashes.sort();
        merkle_root_from_hashes(hashes).map(MerkleRootQuorums::from_byte_array)
    }

    /// Checks this list against the quorum commitment of a coinbase payload,
    /// and every newly added commitment against the masternode list it
    /// co-evolved with. An empty list is trivially valid.
    pub fn verify(
        &self,
        coinbase_payload: &CoinbasePayload,
        new_quorums: &[QuorumEntry],
        masternode_list: &MasternodeList,
    ) -> Result<(), VerificationError> {
        for quorum in new_quorums {
            quorum.validate(masternode_list)?;
        }
        let Some(root) = self.calculate_merkle_root() else {
            return Ok(());
        };
        if coinbase_payload.merkle_root_quorums != root {
            return Err(VerificationError::QuorumListRootMismatch {
                wanted: coinbase_payload.merkle_root_quorums,
                got: root,
            });
        }
        Ok(())
    }
}
