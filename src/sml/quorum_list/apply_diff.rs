use crate::network::message_sml::MnListDiff;
use crate::sml::llmq_type::LLMQType;
use crate::sml::quorum_list::QuorumList;
use crate::sml::quorum_validation_error::QuorumValidationError;

impl QuorumList {
    /// Applies the quorum sections of a diff, producing the successor list.
    ///
    /// `self` is left untouched. The diff's connection to the current chain
    /// position is the masternode list's business; by the time the quorum
    /// list advances, the base-hash precondition has already been checked.
    pub fn apply_diff(&self, diff: &MnListDiff) -> Result<QuorumList, QuorumValidationError> {
        let mut updated = self.clone();
        for deleted in &diff.deleted_quorums {
            let llmq_type = LLMQType::try_from(deleted.llmq_type)?;
            updated.remove(llmq_type, &deleted.quorum_hash);
        }
        for new_quorum in &diff.new_quorums {
            let llmq_type = LLMQType::try_from(new_quorum.llmq_type)?;
            updated.insert(llmq_type, new_quorum.clone());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hashes::Hash;

    use super::*;
    use crate::hash_types::BlockHash;
    use crate::network::message_sml::tests::diff_with_quorums;
    use crate::network::message_sml::QuorumIdentifier;
    use crate::sml::quorum_entry::QuorumEntry;
    use crate::sml::quorum_entry::tests::commitment;

    #[test]
    fn quorum_sections_apply_delete_then_add() {
        let old = commitment(1, LLMQType::LlmqtypeTest);
        let new = commitment(2, LLMQType::LlmqtypeTest);
        let mut list = QuorumList::empty();
        list.insert(LLMQType::LlmqtypeTest, old.clone());

        let diff = diff_with_quorums(
            BlockHash::hash(b"h1"),
            BlockHash::hash(b"h2"),
            11,
            vec![new.clone()],
            vec![QuorumIdentifier {
                llmq_type: old.llmq_type,
                quorum_hash: old.quorum_hash,
            }],
        );

        let updated = list.apply_diff(&diff).unwrap();
        assert_eq!(updated.len(), 1);
        assert!(updated.quorum(LLMQType::LlmqtypeTest, &new.quorum_hash).is_some());
        assert!(updated.quorum(LLMQType::LlmqtypeTest, &old.quorum_hash).is_none());
        // The pre-diff list is untouched.
        assert!(list.quorum(LLMQType::LlmqtypeTest, &old.quorum_hash).is_some());
    }

    #[test]
    fn unknown_quorum_class_rejected() {
        let list = QuorumList::empty();
        let alien = QuorumEntry { llmq_type: 42, ..commitment(1, LLMQType::LlmqtypeTest) };
        let diff = diff_with_quorums(
            BlockHash::hash(b"h1"),
            BlockHash::hash(b"h2"),
            11,
            vec![alien],
            vec![],
        );
        assert_matches!(
            list.apply_diff(&diff),
            Err(QuorumValidationError::UnknownQuorumType(42))
        );
    }
}
