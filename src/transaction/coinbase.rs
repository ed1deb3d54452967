//! The coinbase special-transaction payload.
//!
//! Each mined block carries a coinbase payload binding the block to the
//! masternode list (and, from payload version 2, the quorum list) that is
//! valid at that height. Verifying a diff means recomputing those Merkle
//! roots and comparing them against this record.

use std::io;
use std::io::{Error, ErrorKind};

use hashes::Hash;

use crate::bls_sig_utils::BLSSignature;
use crate::consensus::{Decodable, Encodable, VarInt, encode};
use crate::hash_types::{MerkleRootMasternodeList, MerkleRootQuorums};

/// Payload version from which the quorum-list commitment is present.
pub const COINBASE_PAYLOAD_QUORUMS_VERSION: u16 = 2;

/// The decoded extra payload of a coinbase transaction.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct CoinbasePayload {
    /// Payload version; gates which commitments are present.
    pub version: u16,
    /// Height of the block carrying this coinbase.
    pub height: u32,
    /// Merkle root over the masternode list valid at `height`.
    pub merkle_root_masternode_list: MerkleRootMasternodeList,
    /// Merkle root over the active quorum commitments, zero below version 2.
    pub merkle_root_quorums: MerkleRootQuorums,
    /// Height of the best chain-locked block, version 3 onwards.
    pub best_cl_height: Option<u32>,
    /// Signature of the best chain lock, version 3 onwards.
    pub best_cl_signature: Option<BLSSignature>,
    /// Credit-pool balance, version 3 onwards.
    pub asset_locked_amount: Option<u64>,
}

impl CoinbasePayload {
    /// Whether this payload commits to a quorum list.
    pub fn commits_to_quorums(&self) -> bool {
        self.version >= COINBASE_PAYLOAD_QUORUMS_VERSION
    }
}

impl Encodable for CoinbasePayload {
    fn consensus_encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
        let mut len = 0;
        len += self.version.consensus_encode(w)?;
        len += self.height.consensus_encode(w)?;
        len += self.merkle_root_masternode_list.consensus_encode(w)?;
        if self.version >= 2 {
            len += self.merkle_root_quorums.consensus_encode(w)?;
        }
        if self.version >= 3 {
            if let Some(best_cl_height) = self.best_cl_height {
                len += VarInt(best_cl_height as u64).consensus_encode(w)?;
            } else {
                return Err(Error::new(ErrorKind::InvalidInput, "best_cl_height is not set"));
            }
            if let Some(ref best_cl_signature) = self.best_cl_signature {
                len += best_cl_signature.consensus_encode(w)?;
            } else {
                return Err(Error::new(ErrorKind::InvalidInput, "best_cl_signature is not set"));
            }
            if let Some(asset_locked_amount) = self.asset_locked_amount {
                len += asset_locked_amount.consensus_encode(w)?;
            } else {
                return Err(Error::new(ErrorKind::InvalidInput, "asset_locked_amount is not set"));
            }
        }
        Ok(len)
    }
}

impl Decodable for CoinbasePayload {
    fn consensus_decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, encode::Error> {
        let version = u16::consensus_decode(r)?;
        let height = u32::consensus_decode(r)?;
        let merkle_root_masternode_list = MerkleRootMasternodeList::consensus_decode(r)?;
        let merkle_root_quorums = if version >= 2 {
            MerkleRootQuorums::consensus_decode(r)?
        } else {
            MerkleRootQuorums::all_zeros()
        };
        let best_cl_height = if version >= 3 {
            let height = VarInt::consensus_decode(r)?.0;
            if height > u32::MAX as u64 {
                return Err(encode::Error::ParseFailed("best_cl_height out of range"));
            }
            Some(height as u32)
        } else {
            None
        };
        let best_cl_signature =
            if version >= 3 { Some(BLSSignature::consensus_decode(r)?) } else { None };
        let asset_locked_amount =
            if version >= 3 { Some(u64::consensus_decode(r)?) } else { None };
        Ok(CoinbasePayload {
            version,
            height,
            merkle_root_masternode_list,
            merkle_root_quorums,
            best_cl_height,
            best_cl_signature,
            asset_locked_amount,
        })
    }
}
