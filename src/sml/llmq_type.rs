//! Quorum classes and their parameters.

use core::fmt;

use crate::sml::quorum_validation_error::QuorumValidationError;

/// A long-living masternode quorum class.
///
/// The discriminant is the wire value carried in quorum commitments.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum LLMQType {
    /// 50 members, 60% threshold. The workhorse signing quorum.
    Llmqtype50_60 = 1,
    /// 400 members, 60% threshold.
    Llmqtype400_60 = 2,
    /// 400 members, 85% threshold. Used for chain locks.
    Llmqtype400_85 = 3,
    /// 100 members, 67% threshold.
    Llmqtype100_67 = 4,
    /// 3 members, 2 threshold. Only on test networks.
    LlmqtypeTest = 100,
}

impl LLMQType {
    /// The number of seats in a quorum of this class.
    pub fn size(&self) -> u32 {
        match self {
            LLMQType::Llmqtype50_60 => 50,
            LLMQType::Llmqtype400_60 => 400,
            LLMQType::Llmqtype400_85 => 400,
            LLMQType::Llmqtype100_67 => 100,
            LLMQType::LlmqtypeTest => 3,
        }
    }

    /// The minimum number of members needed for the quorum to sign.
    pub fn threshold(&self) -> u32 {
        match self {
            LLMQType::Llmqtype50_60 => 30,
            LLMQType::Llmqtype400_60 => 240,
            LLMQType::Llmqtype400_85 => 340,
            LLMQType::Llmqtype100_67 => 67,
            LLMQType::LlmqtypeTest => 2,
        }
    }
}

impl TryFrom<u8> for LLMQType {
    type Error = QuorumValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LLMQType::Llmqtype50_60),
            2 => Ok(LLMQType::Llmqtype400_60),
            3 => Ok(LLMQType::Llmqtype400_85),
            4 => Ok(LLMQType::Llmqtype100_67),
            100 => Ok(LLMQType::LlmqtypeTest),
            other => Err(QuorumValidationError::UnknownQuorumType(other)),
        }
    }
}

impl From<LLMQType> for u8 {
    fn from(llmq_type: LLMQType) -> u8 {
        llmq_type as u8
    }
}

impl fmt::Display for LLMQType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LLMQType::Llmqtype50_60 => "llmq_50_60",
            LLMQType::Llmqtype400_60 => "llmq_400_60",
            LLMQType::Llmqtype400_85 => "llmq_400_85",
            LLMQType::Llmqtype100_67 => "llmq_100_67",
            LLMQType::LlmqtypeTest => "llmq_test",
        };
        f.write_str(name)
    }
}
