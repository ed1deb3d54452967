use crate::sml::llmq_type::LLMQType;
use crate::sml::masternode_list::MasternodeList;
use crate::sml::quorum_entry::QuorumEntry;
use crate::sml::quorum_validation_error::QuorumValidationError;

impl QuorumEntry {
    /// Structural validation of a newly mined commitment against the
    /// masternode list it co-evolved with.
    ///
    /// Checks the quorum class is known, the bitsets have one bit per seat,
    /// the signer and valid-member populations reach the class threshold, and
    /// the commitment does not claim more members than the list holds.
    /// Signature math over the commitment hash is the embedding
    /// application's concern.
    pub fn validate(&self, masternode_list: &MasternodeList) -> Result<(), QuorumValidationError> {
        let llmq_type = LLMQType::try_from(self.llmq_type)?;
        let seats = llmq_type.size() as usize;
        if self.signers.len() != seats {
            return Err(QuorumValidationError::InvalidBitsetLength {
                expected: seats,
                got: self.signers.len(),
            });
        }
        if self.valid_members.len() != seats {
            return Err(QuorumValidationError::InvalidBitsetLength {
                expected: seats,
                got: self.valid_members.len(),
            });
        }
        let threshold = llmq_type.threshold();
        if self.signer_count() < threshold {
            return Err(QuorumValidationError::InsufficientSigners {
                required: threshold,
                got: self.signer_count(),
            });
        }
        if self.valid_member_count() < threshold {
            return Err(QuorumValidationError::InsufficientValidMembers {
                required: threshold,
                got: self.valid_member_count(),
            });
        }
        let available = masternode_list.len() as u32;
        if self.valid_member_count() > available {
            return Err(QuorumValidationError::MoreValidMembersThanMasternodes {
                claimed: self.valid_member_count(),
                available,
            });
        }
        Ok(())
    }
}
