mod apply_diff;
mod merkle_roots;
mod scores;

pub use merkle_roots::merkle_root_from_hashes;

use std::collections::BTreeMap;

use hashes::{Hash, sha256d};

use crate::hash_types::{BlockHash, ProTxHash};
use crate::sml::masternode_list_entry::MasternodeListEntry;
use crate::sml::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;

/// Height value of a list that is not anchored to any block yet.
///
/// Serializes as `0xFFFFFFFF`, the same bytes the conventional `-1` height
/// produces under unsigned 32-bit truncation.
pub const UNANCHORED_HEIGHT: u32 = u32::MAX;

/// Ownership record of one unique property digest.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PropertyOwnership {
    /// The masternode currently holding the property.
    pub owner: ProTxHash,
    /// How many live registrations reference the property. Normally 1; can
    /// exceed 1 transiently when a diff replaces an entry that keeps one of
    /// its properties.
    pub ref_count: u32,
}

/// The full masternode set at one chain position.
///
/// A published list is never mutated again; diff application produces a new
/// snapshot, so concurrent readers holding the old one stay consistent.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MasternodeList {
    /// The block this snapshot is anchored to; all zeros for the empty state.
    pub block_hash: BlockHash,
    /// Height matching `block_hash`, [`UNANCHORED_HEIGHT`] for the empty state.
    pub known_height: u32,
    masternodes: BTreeMap<ProTxHash, QualifiedMasternodeListEntry>,
    unique_property_index: BTreeMap<sha256d::Hash, PropertyOwnership>,
}

impl MasternodeList {
    /// The empty list, anchored nowhere.
    pub fn empty() -> Self {
        MasternodeList {
            block_hash: BlockHash::all_zeros(),
            known_height: UNANCHORED_HEIGHT,
            masternodes: BTreeMap::new(),
            unique_property_index: BTreeMap::new(),
        }
    }

    /// Builds a list from entries, anchored at `block_hash`/`known_height`.
    pub fn from_entries(
        entries: impl IntoIterator<Item = MasternodeListEntry>,
        block_hash: BlockHash,
        known_height: u32,
    ) -> Self {
        let mut list = MasternodeList {
            block_hash,
            known_height,
            masternodes: BTreeMap::new(),
            unique_property_index: BTreeMap::new(),
        };
        for entry in entries {
            list.add_entry(entry);
        }
        list
    }

    /// Inserts or replaces the entry registered under its `pro_reg_tx_hash`.
    pub fn add_entry(&mut self, entry: MasternodeListEntry) {
        let qualified = QualifiedMasternodeListEntry::from(entry);
        self.acquire_properties(&qualified.masternode_list_entry);
        if let Some(previous) =
            self.masternodes.insert(qualified.masternode_list_entry.pro_reg_tx_hash, qualified)
        {
            self.release_properties(&previous.masternode_list_entry);
        }
    }

    /// Removes the entry registered under `pro_reg_tx_hash`. No-op when the
    /// entry is absent.
    pub fn remove_entry(&mut self, pro_reg_tx_hash: &ProTxHash) -> bool {
        match self.masternodes.remove(pro_reg_tx_hash) {
            Some(removed) => {
                self.release_properties(&removed.masternode_list_entry);
                true
            }
            None => false,
        }
    }

    /// Looks up an entry by its registration hash.
    pub fn entry(&self, pro_reg_tx_hash: &ProTxHash) -> Option<&QualifiedMasternodeListEntry> {
        self.masternodes.get(pro_reg_tx_hash)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.masternodes.len()
    }

    /// Whether the list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.masternodes.is_empty()
    }

    /// All entries, keyed by registration hash.
    pub fn masternodes(&self) -> &BTreeMap<ProTxHash, QualifiedMasternodeListEntry> {
        &self.masternodes
    }

    /// The uniqueness index over service address, voting key and operator key.
    pub fn unique_property_index(&self) -> &BTreeMap<sha256d::Hash, PropertyOwnership> {
        &self.unique_property_index
    }

    /// Number of entries currently marked valid.
    pub fn valid_count(&self) -> usize {
        self.masternodes.values().filter(|e| e.masternode_list_entry.is_valid).count()
    }

    /// Re-anchors the list without touching its entries. Used when a diff
    /// carries no structural changes.
    pub(crate) fn set_anchor(&mut self, block_hash: BlockHash, known_height: u32) {
        self.block_hash = block_hash;
        self.known_height = known_height;
    }

    /// Rebuilds the uniqueness index from the entries. Used to validate a
    /// loaded snapshot.
    pub(crate) fn rebuilt_property_index(&self) -> BTreeMap<sha256d::Hash, PropertyOwnership> {
        let mut index = BTreeMap::new();
        for entry in self.masternodes.values() {
            for hash in entry.masternode_list_entry.property_hashes() {
                index
                    .entry(hash)
                    .and_modify(|ownership: &mut PropertyOwnership| {
                        ownership.owner = entry.masternode_list_entry.pro_reg_tx_hash;
                        ownership.ref_count += 1;
                    })
                    .or_insert(PropertyOwnership {
                        owner: entry.masternode_list_entry.pro_reg_tx_hash,
                        ref_count: 1,
                    });
            }
        }
        index
    }

    pub(crate) fn restore(
        block_hash: BlockHash,
        known_height: u32,
        masternodes: BTreeMap<ProTxHash, QualifiedMasternodeListEntry>,
        unique_property_index: BTreeMap<sha256d::Hash, PropertyOwnership>,
    ) -> Self {
        MasternodeList { block_hash, known_height, masternodes, unique_property_index }
    }

    fn acquire_properties(&mut self, entry: &MasternodeListEntry) {
        for hash in entry.property_hashes() {
            self.unique_property_index
                .entry(hash)
                .and_modify(|ownership| {
                    ownership.owner = entry.pro_reg_tx_hash;
                    ownership.ref_count += 1;
                })
                .or_insert(PropertyOwnership { owner: entry.pro_reg_tx_hash, ref_count: 1 });
        }
    }

    fn release_properties(&mut self, entry: &MasternodeListEntry) {
        for hash in entry.property_hashes() {
            if let Some(ownership) = self.unique_property_index.get_mut(&hash) {
                if ownership.ref_count <= 1 {
                    self.unique_property_index.remove(&hash);
                } else {
                    ownership.ref_count -= 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hashes::Hash;

    use super::*;
    use crate::sml::masternode_list_entry::tests::entry;

    #[test]
    fn empty_list_is_unanchored() {
        let list = MasternodeList::empty();
        assert_eq!(list.block_hash, BlockHash::all_zeros());
        assert_eq!(list.known_height, UNANCHORED_HEIGHT);
        assert!(list.is_empty());
    }

    #[test]
    fn index_tracks_adds_and_removes() {
        let mut list = MasternodeList::empty();
        let first = entry(1, true);
        let second = entry(2, true);
        list.add_entry(first.clone());
        list.add_entry(second.clone());

        // Three property digests per entry, all distinct here.
        assert_eq!(list.unique_property_index().len(), 6);
        for hash in first.property_hashes() {
            let ownership = list.unique_property_index()[&hash];
            assert_eq!(ownership.owner, first.pro_reg_tx_hash);
            assert_eq!(ownership.ref_count, 1);
        }

        assert!(list.remove_entry(&first.pro_reg_tx_hash));
        assert_eq!(list.unique_property_index().len(), 3);
        assert!(!list.remove_entry(&first.pro_reg_tx_hash));
        assert_eq!(list.len(), 1);
        assert_eq!(list.rebuilt_property_index(), *list.unique_property_index());
    }

    #[test]
    fn replacing_an_entry_does_not_leak_properties() {
        let mut list = MasternodeList::empty();
        let original = entry(1, true);
        list.add_entry(original.clone());

        // Same identity, different voting key: the old voting-key digest
        // must be released, the shared digests must keep a single reference.
        let mut replacement = entry(1, true);
        replacement.key_id_voting = crate::hash_types::PubkeyHash::hash(b"new voter");
        list.add_entry(replacement.clone());

        assert_eq!(list.len(), 1);
        assert_eq!(list.unique_property_index().len(), 3);
        assert!(
            list.unique_property_index()
                .contains_key(&replacement.voting_key_property_hash())
        );
        assert!(
            !list
                .unique_property_index()
                .contains_key(&original.voting_key_property_hash())
        );
        for ownership in list.unique_property_index().values() {
            assert_eq!(ownership.ref_count, 1);
        }
        assert_eq!(list.rebuilt_property_index(), *list.unique_property_index());
    }

    #[test]
    fn shared_property_is_ref_counted() {
        let mut list = MasternodeList::empty();
        let first = entry(1, true);
        // A different masternode reusing the first one's service address.
        let mut second = entry(2, true);
        second.service_address = first.service_address;

        list.add_entry(first.clone());
        list.add_entry(second.clone());
        let shared = first.service_property_hash();
        assert_eq!(list.unique_property_index()[&shared].ref_count, 2);

        list.remove_entry(&first.pro_reg_tx_hash);
        assert_eq!(list.unique_property_index()[&shared].ref_count, 1);
        list.remove_entry(&second.pro_reg_tx_hash);
        assert!(!list.unique_property_index().contains_key(&shared));
    }
}
