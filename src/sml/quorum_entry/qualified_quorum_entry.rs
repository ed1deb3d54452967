use crate::sml::quorum_entry::QuorumEntry;

/// A quorum commitment with its derived hashes cached.
///
/// Both hashes are consulted repeatedly (Merkle roots, signature checks by
/// embedding applications), so they are computed once when the commitment
/// enters a list. Never serialized; rebuilt on load.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct QualifiedQuorumEntry {
    /// The underlying commitment.
    pub quorum_entry: QuorumEntry,
    /// Cached double-SHA256 of the commitment's serialization.
    pub entry_hash: [u8; 32],
    /// Cached hash of the signed DKG-outcome fields.
    pub commitment_hash: [u8; 32],
}

impl From<QuorumEntry> for QualifiedQuorumEntry {
    fn from(quorum_entry: QuorumEntry) -> Self {
        let entry_hash = quorum_entry.calculate_entry_hash();
        let commitment_hash = quorum_entry.calculate_commitment_hash();
        QualifiedQuorumEntry { quorum_entry, entry_hash, commitment_hash }
    }
}
