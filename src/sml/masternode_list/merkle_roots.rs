use hashes::{Hash, sha256d};

use crate::error::VerificationError;
use crate::hash_types::MerkleRootMasternodeList;
use crate::sml::masternode_list::MasternodeList;
use crate::transaction::coinbase::CoinbasePayload;

/// Computes a Merkle root over an ordered list of 32-byte hashes.
///
/// Internal nodes are the double-SHA256 of the concatenated children; a level
/// with odd cardinality duplicates its last node. Returns `None` for an empty
/// input.
#[inline]
pub fn merkle_root_from_hashes(hashes: Vec<[u8; 32]>) -> Option<[u8; 32]> {
    let mut level = hashes;
    if level.is_empty() {
        return None;
    }
    while level.len() > 1 {
        let mut higher_level = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let mut preimage = [0u8; 64];
            preimage[..32].copy_from_slice(&pair[0]);
            preimage[32..].copy_from_slice(pair.get(1).unwrap_or(&pair[0]));
            higher_level.push(sha256d::Hash::hash(&preimage).to_byte_array());
        }
        level = higher_level;
    }
    Some(level[0])
}

impl MasternodeList {
    /// The Merkle root binding this list to a coinbase commitment, or `None`
    /// when the list is empty.
    ///
    /// Leaf order is the canonical ordering contract: entry hashes sorted by
    /// their registration hash, ascending by internal byte value. The result
    /// does not depend on insertion order.
    pub fn calculate_merkle_root(&self) -> Option<MerkleRootMasternodeList> {
        merkle_root_from_hashes(self.hashes_for_merkle_root())
            .map(MerkleRootMasternodeList::from_byte_array)
    }

    /// The entry hashes in canonical leaf order.
    pub fn hashes_for_merkle_root(&self) -> Vec<[u8; 32]> {
        let mut pro_reg_tx_hashes: Vec<_> = self.masternodes().keys().collect();
        pro_reg_tx_hashes.sort_by_key(|hash| hash.to_byte_array());
        pro_reg_tx_hashes
            .into_iter()
            .map(|hash| self.masternodes()[hash].entry_hash)
            .collect()
    }

    /// Checks this list against the masternode commitment in a coinbase
    /// payload.
    ///
    /// An empty list is trivially valid: there are no entries to bind, so no
    /// root is computed or compared.
    pub fn verify(&self, coinbase_payload: &CoinbasePayload) -> Result<(), VerificationError> {
        let Some(root) = self.calculate_merkle_root() else {
            return Ok(());
        };
        if coinbase_payload.merkle_root_masternode_list != root {
            return Err(VerificationError::MasternodeListRootMismatch {
                wanted: coinbase_payload.merkle_root_masternode_list,
                got: root,
            });
        }
        Ok(())
    }
}
