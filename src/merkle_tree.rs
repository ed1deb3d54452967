//! Partial Merkle trees.
//!
//! A diff proves that its coinbase transaction belongs to the target block by
//! shipping a partial Merkle tree: the transaction count of the block, a
//! depth-first subset of tree nodes, and a bit flag per traversed node
//! describing whether it is an ancestor of a matched transaction.
//! [`PartialMerkleTree::extract_matches`] replays the traversal, recovers the
//! matched txids and returns the Merkle root the proof commits to.

use hashes::{Hash, sha256d};
use thiserror::Error;

use crate::consensus::{Decodable, Encodable, encode};
use crate::hash_types::{TxMerkleNode, Txid};

/// Structural failure while replaying a partial Merkle proof.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleProofError {
    /// The proof claims a block with no transactions.
    #[error("partial Merkle tree contains no transactions")]
    NoTransactions,
    /// More hashes than transactions in the block.
    #[error("partial Merkle tree contains more hashes than transactions")]
    TooManyHashes,
    /// Fewer flag bits than hashes; the traversal cannot consume every hash.
    #[error("partial Merkle tree has fewer flag bits than hashes")]
    NotEnoughBits,
    /// The traversal ran off the end of the flag bits.
    #[error("overflowed the bits array of the partial Merkle tree")]
    BitsArrayOverflow,
    /// The traversal ran off the end of the hash list.
    #[error("overflowed the hash array of the partial Merkle tree")]
    HashArrayOverflow,
    /// Left and right child carried the same hash, a known malleation vector.
    #[error("found identical left and right hashes in the partial Merkle tree")]
    IdenticalHashesFound,
    /// The traversal finished without consuming the whole proof.
    #[error("partial Merkle tree not fully consumed: {0}")]
    NotAllConsumed(&'static str),
}

/// A partial Merkle tree proving inclusion of a subset of a block's
/// transactions.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PartialMerkleTree {
    /// Number of transactions in the full block.
    num_transactions: u32,
    /// Node flags in depth-first order.
    bits: Vec<bool>,
    /// The subset of node hashes shipped with the proof.
    hashes: Vec<TxMerkleNode>,
}

impl PartialMerkleTree {
    /// Builds a proof over `txids` marking the transactions whose `matches`
    /// entry is `true`.
    ///
    /// Both slices must have the block's transaction count as their length.
    pub fn from_txids(txids: &[Txid], matches: &[bool]) -> Self {
        debug_assert_eq!(txids.len(), matches.len());
        let mut tree = PartialMerkleTree {
            num_transactions: txids.len() as u32,
            bits: Vec::with_capacity(txids.len()),
            hashes: Vec::new(),
        };
        let mut height = 0;
        while tree.tree_width(height) > 1 {
            height += 1;
        }
        tree.build_branch(height, 0, txids, matches);
        tree
    }

    /// Number of transactions the proof claims for the block.
    pub fn num_transactions(&self) -> u32 {
        self.num_transactions
    }

    /// Replays the proof, filling `matches` with the matched txids and
    /// `indexes` with their positions in the block, and returns the Merkle
    /// root the proof evaluates to.
    pub fn extract_matches(
        &self,
        matches: &mut Vec<Txid>,
        indexes: &mut Vec<u32>,
    ) -> Result<TxMerkleNode, MerkleProofError> {
        matches.clear();
        indexes.clear();
        if self.num_transactions == 0 {
            return Err(MerkleProofError::NoTransactions);
        }
        if self.hashes.len() > self.num_transactions as usize {
            return Err(MerkleProofError::TooManyHashes);
        }
        if self.bits.len() < self.hashes.len() {
            return Err(MerkleProofError::NotEnoughBits);
        }

        let mut height = 0;
        while self.tree_width(height) > 1 {
            height += 1;
        }
        let mut bits_used = 0usize;
        let mut hashes_used = 0usize;
        let root =
            self.extract_branch(height, 0, &mut bits_used, &mut hashes_used, matches, indexes)?;
        // Every hash must be consumed, and only the byte-padding bits may remain.
        if hashes_used != self.hashes.len() {
            return Err(MerkleProofError::NotAllConsumed("unused hashes remain"));
        }
        if bits_used.div_ceil(8) != self.bits.len().div_ceil(8) {
            return Err(MerkleProofError::NotAllConsumed("unused flag bits remain"));
        }
        Ok(root)
    }

    /// Width of the tree at `height`, counted from the leaves upwards.
    fn tree_width(&self, height: u32) -> u32 {
        (self.num_transactions + (1 << height) - 1) >> height
    }

    fn build_branch(&mut self, height: u32, pos: u32, txids: &[Txid], matches: &[bool]) {
        let leaves_from = (pos << height) as usize;
        let leaves_to = usize::min(((pos + 1) << height) as usize, txids.len());
        let parent_of_match = matches[leaves_from..leaves_to].iter().any(|m| *m);
        self.bits.push(parent_of_match);
        if height == 0 || !parent_of_match {
            self.hashes.push(self.branch_hash(height, pos, txids));
        } else {
            self.build_branch(height - 1, pos * 2, txids, matches);
            if pos * 2 + 1 < self.tree_width(height - 1) {
                self.build_branch(height - 1, pos * 2 + 1, txids, matches);
            }
        }
    }

    fn branch_hash(&self, height: u32, pos: u32, txids: &[Txid]) -> TxMerkleNode {
        if height == 0 {
            TxMerkleNode::from_byte_array(txids[pos as usize].to_byte_array())
        } else {
            let left = self.branch_hash(height - 1, pos * 2, txids);
            let right = if pos * 2 + 1 < self.tree_width(height - 1) {
                self.branch_hash(height - 1, pos * 2 + 1, txids)
            } else {
                left
            };
            combine(left, right)
        }
    }

    fn extract_branch(
        &self,
        height: u32,
        pos: u32,
        bits_used: &mut usize,
        hashes_used: &mut usize,
        matches: &mut Vec<Txid>,
        indexes: &mut Vec<u32>,
    ) -> Result<TxMerkleNode, MerkleProofError> {
        if *bits_used >= self.bits.len() {
            return Err(MerkleProofError::BitsArrayOverflow);
        }
        let parent_of_match = self.bits[*bits_used];
        *bits_used += 1;
        if height == 0 || !parent_of_match {
            if *hashes_used >= self.hashes.len() {
                return Err(MerkleProofError::HashArrayOverflow);
            }
            let hash = self.hashes[*hashes_used];
            *hashes_used += 1;
            if height == 0 && parent_of_match {
                matches.push(Txid::from_byte_array(hash.to_byte_array()));
                indexes.push(pos);
            }
            Ok(hash)
        } else {
            let left =
                self.extract_branch(height - 1, pos * 2, bits_used, hashes_used, matches, indexes)?;
            let right = if pos * 2 + 1 < self.tree_width(height - 1) {
                let right = self.extract_branch(
                    height - 1,
                    pos * 2 + 1,
                    bits_used,
                    hashes_used,
                    matches,
                    indexes,
                )?;
                if right == left {
                    return Err(MerkleProofError::IdenticalHashesFound);
                }
                right
            } else {
                left
            };
            Ok(combine(left, right))
        }
    }
}

fn combine(left: TxMerkleNode, right: TxMerkleNode) -> TxMerkleNode {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(&left.to_byte_array());
    preimage[32..].copy_from_slice(&right.to_byte_array());
    TxMerkleNode::from_byte_array(sha256d::Hash::hash(&preimage).to_byte_array())
}

impl Encodable for PartialMerkleTree {
    fn consensus_encode<W: std::io::Write + ?Sized>(
        &self,
        writer: &mut W,
    ) -> Result<usize, std::io::Error> {
        let mut len = self.num_transactions.consensus_encode(writer)?;
        len += self.hashes.consensus_encode(writer)?;
        let mut packed = vec![0u8; self.bits.len().div_ceil(8)];
        for (index, bit) in self.bits.iter().enumerate() {
            packed[index / 8] |= (*bit as u8) << (index % 8);
        }
        len += packed.consensus_encode(writer)?;
        Ok(len)
    }
}

impl Decodable for PartialMerkleTree {
    fn consensus_decode<R: std::io::Read + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, encode::Error> {
        let num_transactions = u32::consensus_decode(reader)?;
        let hashes = Vec::<TxMerkleNode>::consensus_decode(reader)?;
        let packed = Vec::<u8>::consensus_decode(reader)?;
        let mut bits = Vec::with_capacity(packed.len() * 8);
        for byte in &packed {
            for bit in 0..8 {
                bits.push(byte & (1 << bit) != 0);
            }
        }
        Ok(PartialMerkleTree { num_transactions, bits, hashes })
    }
}
