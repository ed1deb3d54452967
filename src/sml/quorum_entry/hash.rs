use hashes::{Hash, sha256d};

use crate::consensus::Encodable;
use crate::sml::quorum_entry::{QuorumEntry, write_fixed_bitset};

impl QuorumEntry {
    /// The commitment's content hash: double-SHA256 of its full
    /// serialization. The leaf representing this quorum in the quorum-list
    /// Merkle root.
    pub fn calculate_entry_hash(&self) -> [u8; 32] {
        let mut writer = Vec::new();
        self.consensus_encode(&mut writer).expect("encoding failed");
        sha256d::Hash::hash(&writer).to_byte_array()
    }

    /// The hash the quorum members actually sign: the DKG outcome fields
    /// only, without the signatures over them.
    pub fn calculate_commitment_hash(&self) -> [u8; 32] {
        let mut writer = Vec::new();
        self.llmq_type.consensus_encode(&mut writer).expect("encoding failed");
        self.quorum_hash.consensus_encode(&mut writer).expect("encoding failed");
        write_fixed_bitset(&mut writer, &self.valid_members).expect("encoding failed");
        self.quorum_public_key.consensus_encode(&mut writer).expect("encoding failed");
        self.quorum_vvec_hash.consensus_encode(&mut writer).expect("encoding failed");
        sha256d::Hash::hash(&writer).to_byte_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls_sig_utils::BLSSignature;
    use crate::sml::llmq_type::LLMQType;
    use crate::sml::quorum_entry::tests::commitment;

    #[test]
    fn commitment_hash_ignores_signatures() {
        let original = commitment(1, LLMQType::LlmqtypeTest);
        let resigned = QuorumEntry {
            quorum_sig: BLSSignature::from([9; 96]),
            all_commitment_aggregated_signature: BLSSignature::from([8; 96]),
            ..original.clone()
        };
        assert_eq!(original.calculate_commitment_hash(), resigned.calculate_commitment_hash());
        assert_ne!(original.calculate_entry_hash(), resigned.calculate_entry_hash());
    }
}
