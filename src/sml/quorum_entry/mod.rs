mod hash;
pub mod qualified_quorum_entry;
mod validation;

use std::io::{Read, Write};

use crate::bls_sig_utils::{BLSPublicKey, BLSSignature};
use crate::consensus::{Decodable, Encodable, VarInt, encode};
use crate::hash_types::{QuorumHash, QuorumVVecHash};

/// A quorum finalization commitment: the mined record of a completed
/// distributed key generation, naming the quorum's members and aggregate key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct QuorumEntry {
    /// Commitment serialization version.
    pub version: u16,
    /// Raw quorum class; validated against [`crate::sml::llmq_type::LLMQType`]
    /// when the commitment is applied.
    pub llmq_type: u8,
    /// Hash of the quorum's defining block.
    pub quorum_hash: QuorumHash,
    /// Quorum index, only serialized for rotated commitments (versions 2 and 4).
    pub quorum_index: Option<i16>,
    /// One bit per seat: members that signed the commitment.
    pub signers: Vec<bool>,
    /// One bit per seat: members that completed the key generation.
    pub valid_members: Vec<bool>,
    /// The quorum's aggregate BLS public key.
    pub quorum_public_key: BLSPublicKey,
    /// Hash of the quorum verification vector.
    pub quorum_vvec_hash: QuorumVVecHash,
    /// Recovered threshold signature over the commitment hash.
    pub quorum_sig: BLSSignature,
    /// Aggregate of the members' individual commitment signatures.
    pub all_commitment_aggregated_signature: BLSSignature,
}

impl QuorumEntry {
    /// Number of set bits in the valid-members bitset.
    pub fn valid_member_count(&self) -> u32 {
        self.valid_members.iter().filter(|b| **b).count() as u32
    }

    /// Number of set bits in the signers bitset.
    pub fn signer_count(&self) -> u32 {
        self.signers.iter().filter(|b| **b).count() as u32
    }
}

pub(crate) fn write_fixed_bitset<W: Write + ?Sized>(
    w: &mut W,
    bits: &[bool],
) -> Result<usize, std::io::Error> {
    let mut len = VarInt(bits.len() as u64).consensus_encode(w)?;
    let mut packed = vec![0u8; bits.len().div_ceil(8)];
    for (index, bit) in bits.iter().enumerate() {
        packed[index / 8] |= (*bit as u8) << (index % 8);
    }
    w.write_all(&packed)?;
    len += packed.len();
    Ok(len)
}

pub(crate) fn read_fixed_bitset<R: Read + ?Sized>(
    r: &mut R,
    max_bits: usize,
) -> Result<Vec<bool>, encode::Error> {
    let count = VarInt::consensus_decode(r)?.0 as usize;
    if count > max_bits {
        return Err(encode::Error::OversizedVectorAllocation { requested: count, max: max_bits });
    }
    let mut packed = vec![0u8; count.div_ceil(8)];
    r.read_exact(&mut packed)?;
    let mut bits = Vec::with_capacity(count);
    for position in 0..count {
        bits.push(packed[position / 8] & (1 << (position % 8)) != 0);
    }
    Ok(bits)
}

/// A bitset larger than any defined quorum class is hostile.
const MAX_QUORUM_BITSET_BITS: usize = 1024;

impl Encodable for QuorumEntry {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, std::io::Error> {
        let mut len = 0;
        len += self.version.consensus_encode(w)?;
        len += self.llmq_type.consensus_encode(w)?;
        len += self.quorum_hash.consensus_encode(w)?;
        if self.version == 2 || self.version == 4 {
            match self.quorum_index {
                Some(quorum_index) => len += quorum_index.consensus_encode(w)?,
                None => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "rotated commitment without quorum index",
                    ));
                }
            }
        }
        len += write_fixed_bitset(w, &self.signers)?;
        len += write_fixed_bitset(w, &self.valid_members)?;
        len += self.quorum_public_key.consensus_encode(w)?;
        len += self.quorum_vvec_hash.consensus_encode(w)?;
        len += self.quorum_sig.consensus_encode(w)?;
        len += self.all_commitment_aggregated_signature.consensus_encode(w)?;
        Ok(len)
    }
}

impl Decodable for QuorumEntry {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, encode::Error> {
        let version = u16::consensus_decode(r)?;
        let llmq_type = u8::consensus_decode(r)?;
        let quorum_hash = QuorumHash::consensus_decode(r)?;
        let quorum_index =
            if version == 2 || version == 4 { Some(i16::consensus_decode(r)?) } else { None };
        let signers = read_fixed_bitset(r, MAX_QUORUM_BITSET_BITS)?;
        let valid_members = read_fixed_bitset(r, MAX_QUORUM_BITSET_BITS)?;
        let quorum_public_key = BLSPublicKey::consensus_decode(r)?;
        let quorum_vvec_hash = QuorumVVecHash::consensus_decode(r)?;
        let quorum_sig = BLSSignature::consensus_decode(r)?;
        let all_commitment_aggregated_signature = BLSSignature::consensus_decode(r)?;
        Ok(QuorumEntry {
            version,
            llmq_type,
            quorum_hash,
            quorum_index,
            signers,
            valid_members,
            quorum_public_key,
            quorum_vvec_hash,
            quorum_sig,
            all_commitment_aggregated_signature,
        })
    }
}
