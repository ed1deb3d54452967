//! Hash types.
//!
//! Newtypes over the raw digest types so that hashes of different meaning
//! (block hash, registration transaction hash, Merkle commitment, ...)
//! cannot be mixed up. All of them serialize in internal byte order and
//! display in the conventional reversed order.

use core::cmp::Ordering;
use core::fmt;

use hashes::{Hash, hash160, sha256, sha256d};

macro_rules! impl_hashencode {
    ($hashtype:ident) => {
        impl $crate::consensus::Encodable for $hashtype {
            fn consensus_encode<W: std::io::Write + ?Sized>(
                &self,
                w: &mut W,
            ) -> Result<usize, std::io::Error> {
                $crate::consensus::Encodable::consensus_encode(&self.to_byte_array(), w)
            }
        }

        impl $crate::consensus::Decodable for $hashtype {
            fn consensus_decode<R: std::io::Read + ?Sized>(
                r: &mut R,
            ) -> Result<Self, $crate::consensus::encode::Error> {
                Ok(Self::from_byte_array(
                    <<$hashtype as hashes::Hash>::Bytes as $crate::consensus::Decodable>::consensus_decode(r)?,
                ))
            }
        }
    };
}

hashes::hash_newtype! {
    /// A block hash.
    pub struct BlockHash(sha256d::Hash);

    /// A transaction id.
    pub struct Txid(sha256d::Hash);

    /// The hash of a masternode's provider registration transaction. The
    /// identity of a masternode for its whole lifetime.
    pub struct ProTxHash(sha256d::Hash);

    /// The hash of the block in which a masternode's registration reached
    /// confirmation depth.
    pub struct ConfirmedHash(sha256d::Hash);

    /// Single-SHA256 of a confirmed hash concatenated with the owning
    /// registration transaction hash. Precomputed input to quorum scoring.
    pub struct ConfirmedHashHashedWithProRegTx(sha256::Hash);

    /// A per-quorum-cycle value mixed into the scoring function.
    pub struct QuorumModifierHash(sha256d::Hash);

    /// The hash of a quorum verification vector.
    pub struct QuorumVVecHash(sha256d::Hash);

    /// A node in a transaction Merkle tree.
    pub struct TxMerkleNode(sha256d::Hash);

    /// The masternode-list commitment carried in a coinbase payload.
    pub struct MerkleRootMasternodeList(sha256d::Hash);

    /// The quorum-list commitment carried in a coinbase payload.
    pub struct MerkleRootQuorums(sha256d::Hash);

    /// A hash of a public key.
    pub struct PubkeyHash(hash160::Hash);
}

/// A hash used to identify a quorum; always the hash of the quorum's
/// defining block.
pub type QuorumHash = BlockHash;

impl_hashencode!(BlockHash);
impl_hashencode!(Txid);
impl_hashencode!(ProTxHash);
impl_hashencode!(ConfirmedHash);
impl_hashencode!(ConfirmedHashHashedWithProRegTx);
impl_hashencode!(QuorumModifierHash);
impl_hashencode!(QuorumVVecHash);
impl_hashencode!(TxMerkleNode);
impl_hashencode!(MerkleRootMasternodeList);
impl_hashencode!(MerkleRootQuorums);
impl_hashencode!(PubkeyHash);

/// A masternode's deterministic rank score for one quorum cycle.
///
/// Not a wire type. Ordering compares the reversed (display-order) bytes,
/// matching the numeric comparison the ranking algorithm is defined over.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ScoreHash(sha256::Hash);

impl ScoreHash {
    /// Computes the score of a confirmed masternode under `modifier`.
    ///
    /// A single SHA256 pass, not the usual double hash, over the wire-order
    /// bytes of the precomputed confirmed/registration digest and the
    /// modifier.
    pub fn create_score(
        confirmed_hash_hashed_with_pro_reg_tx: ConfirmedHashHashedWithProRegTx,
        modifier: QuorumModifierHash,
    ) -> Self {
        let mut preimage = Vec::with_capacity(64);
        preimage.extend_from_slice(&confirmed_hash_hashed_with_pro_reg_tx.to_byte_array());
        preimage.extend_from_slice(&modifier.to_byte_array());
        ScoreHash(sha256::Hash::hash(&preimage))
    }

    /// Returns the underlying bytes in internal order.
    pub fn to_byte_array(self) -> [u8; 32] {
        self.0.to_byte_array()
    }

    /// Builds a score from internal-order bytes.
    pub fn from_byte_array(bytes: [u8; 32]) -> Self {
        ScoreHash(sha256::Hash::from_byte_array(bytes))
    }
}

impl Ord for ScoreHash {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut lhs = self.0.to_byte_array();
        let mut rhs = other.0.to_byte_array();
        lhs.reverse();
        rhs.reverse();
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for ScoreHash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ScoreHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for ScoreHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScoreHash({})", self.0)
    }
}
