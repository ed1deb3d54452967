use std::collections::BTreeMap;

use hashes::{Hash, sha256d};

use crate::consensus::{Encodable, VarInt};
use crate::hash_types::{ProTxHash, QuorumHash, QuorumModifierHash, ScoreHash};
use crate::sml::llmq_type::LLMQType;
use crate::sml::masternode_list::MasternodeList;
use crate::sml::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;

impl MasternodeList {
    /// Scores of every valid, confirmed entry under `modifier`, keyed by
    /// score. Unconfirmed and invalid entries are absent.
    pub fn calculate_scores(
        &self,
        modifier: QuorumModifierHash,
    ) -> BTreeMap<ScoreHash, &QualifiedMasternodeListEntry> {
        self.masternodes()
            .values()
            .filter_map(|entry| entry.score(modifier).map(|score| (score, entry)))
            .collect()
    }

    /// The 1-based rank of a masternode under `modifier`, counting from the
    /// highest score. `None` when the masternode is absent or does not score.
    pub fn masternode_rank(
        &self,
        pro_reg_tx_hash: &ProTxHash,
        modifier: QuorumModifierHash,
    ) -> Option<usize> {
        self.entry(pro_reg_tx_hash)?;
        let scores = self.calculate_scores(modifier);
        scores
            .values()
            .rev()
            .position(|entry| entry.masternode_list_entry.pro_reg_tx_hash == *pro_reg_tx_hash)
            .map(|position| position + 1)
    }

    /// The quorum modifier for one quorum: double-SHA256 of the compact-size
    /// quorum class followed by the quorum hash.
    pub fn quorum_modifier(llmq_type: LLMQType, quorum_hash: QuorumHash) -> QuorumModifierHash {
        let mut writer = Vec::with_capacity(33);
        VarInt(u8::from(llmq_type) as u64)
            .consensus_encode(&mut writer)
            .expect("encoding failed");
        writer.extend_from_slice(&quorum_hash.to_byte_array());
        QuorumModifierHash::from_byte_array(sha256d::Hash::hash(&writer).to_byte_array())
    }

    /// The masternodes eligible for a quorum, best score first, capped at the
    /// class size.
    pub fn valid_masternodes_for_quorum(
        &self,
        llmq_type: LLMQType,
        quorum_hash: QuorumHash,
    ) -> Vec<&QualifiedMasternodeListEntry> {
        let modifier = Self::quorum_modifier(llmq_type, quorum_hash);
        self.calculate_scores(modifier)
            .into_values()
            .rev()
            .take(llmq_type.size() as usize)
            .collect()
    }
}
