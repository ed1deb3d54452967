use crate::hash_types::{QuorumModifierHash, ScoreHash};
use crate::sml::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;

impl QualifiedMasternodeListEntry {
    /// The entry's rank score under `modifier`, or `None` if the entry is
    /// invalid or unconfirmed.
    ///
    /// Unconfirmed entries never score; otherwise an attacker could grind
    /// registration hashes to steer freshly registered masternodes into a
    /// chosen future quorum.
    pub fn score(&self, modifier: QuorumModifierHash) -> Option<ScoreHash> {
        if !self.masternode_list_entry.is_valid {
            return None;
        }
        self.confirmed_hash_hashed_with_pro_reg_tx
            .map(|digest| ScoreHash::create_score(digest, modifier))
    }
}
