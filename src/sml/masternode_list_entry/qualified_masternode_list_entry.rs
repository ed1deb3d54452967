use std::cmp::Ordering;

use hashes::Hash;

use crate::hash_types::ConfirmedHashHashedWithProRegTx;
use crate::sml::masternode_list_entry::MasternodeListEntry;

/// A masternode list entry with its derived hashes cached.
///
/// The entry hash is consulted on every Merkle-root computation and the
/// confirmed/registration digest on every scoring pass, so both are computed
/// once when the entry enters a list. Neither is ever serialized; they are
/// rebuilt on load.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct QualifiedMasternodeListEntry {
    /// The underlying entry.
    pub masternode_list_entry: MasternodeListEntry,
    /// Cached double-SHA256 of the entry's serialization.
    pub entry_hash: [u8; 32],
    /// Cached single-SHA256 of `confirmed_hash ∥ pro_reg_tx_hash`, present
    /// only once the registration is confirmed.
    pub confirmed_hash_hashed_with_pro_reg_tx: Option<ConfirmedHashHashedWithProRegTx>,
}

impl Ord for QualifiedMasternodeListEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.masternode_list_entry.cmp(&other.masternode_list_entry)
    }
}

impl PartialOrd for QualifiedMasternodeListEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<MasternodeListEntry> for QualifiedMasternodeListEntry {
    fn from(masternode_list_entry: MasternodeListEntry) -> Self {
        let entry_hash = masternode_list_entry.calculate_entry_hash();
        let confirmed_hash_hashed_with_pro_reg_tx =
            masternode_list_entry.confirmed_hash.map(|confirmed_hash| {
                ConfirmedHashHashedWithProRegTx::hash(
                    &[
                        confirmed_hash.to_byte_array(),
                        masternode_list_entry.pro_reg_tx_hash.to_byte_array(),
                    ]
                    .concat(),
                )
            });
        QualifiedMasternodeListEntry {
            masternode_list_entry,
            entry_hash,
            confirmed_hash_hashed_with_pro_reg_tx,
        }
    }
}
