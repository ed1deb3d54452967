use thiserror::Error;

/// Structural problems with a quorum commitment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuorumValidationError {
    /// The commitment names a quorum class this crate does not know.
    #[error("unknown quorum type {0}")]
    UnknownQuorumType(u8),

    /// A member bitset does not have exactly one bit per quorum seat.
    #[error("quorum bitset has {got} entries, quorum size is {expected}")]
    InvalidBitsetLength {
        /// The quorum class size.
        expected: usize,
        /// The length actually carried.
        got: usize,
    },

    /// Fewer valid members than the class threshold.
    #[error("{got} valid members, quorum threshold is {required}")]
    InsufficientValidMembers {
        /// The class threshold.
        required: u32,
        /// The number of set bits.
        got: u32,
    },

    /// Fewer signers than the class threshold.
    #[error("{got} signers, quorum threshold is {required}")]
    InsufficientSigners {
        /// The class threshold.
        required: u32,
        /// The number of set bits.
        got: u32,
    },

    /// The commitment claims more valid members than masternodes exist.
    #[error("{claimed} valid members claimed but the masternode list holds {available} entries")]
    MoreValidMembersThanMasternodes {
        /// Set bits in the valid-members bitset.
        claimed: u32,
        /// Entries in the masternode list.
        available: u32,
    },
}
