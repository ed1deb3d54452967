//! Binary encoding and decoding of protocol structures.
//!
//! Integers are little-endian. Collections are prefixed with a compact-size
//! count (1, 3, 5 or 9 bytes depending on magnitude). Hash fields are written
//! in internal byte order, which is the reverse of the conventional display
//! order; callers that render hashes for humans get the reversal for free
//! from the hash types' `Display` implementations.
//!
//! Decoding is defensive: a collection count is checked against
//! [`MAX_VEC_SIZE`] before any allocation happens, so a hostile peer cannot
//! make us reserve gigabytes by declaring an absurd element count.

use std::io::{self, Cursor, Read, Write};

use thiserror::Error;

use crate::network::message_sml::QuorumIdentifier;
use crate::sml::masternode_list_entry::MasternodeListEntry;
use crate::sml::quorum_entry::QuorumEntry;
use crate::transaction::{TxIn, TxOut};

/// Upper bound, in bytes, on the declared size of any decoded collection.
pub const MAX_VEC_SIZE: usize = 32 * 1024 * 1024;

/// Decoding error.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying reader failed or ran out of bytes.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A declared collection size would require reading past any sane buffer.
    #[error("allocation of oversized vector requested: {requested} > {max}")]
    OversizedVectorAllocation {
        /// Bytes the declared count would require.
        requested: usize,
        /// The enforced cap.
        max: usize,
    },
    /// A compact-size integer used more bytes than its value needs.
    #[error("non-minimal compact-size integer")]
    NonMinimalVarInt,
    /// A special transaction carried a payload type this crate does not handle.
    #[error("unsupported special transaction type {0}")]
    UnsupportedSpecialTransaction(u16),
    /// A tagged field carried a value outside its known range.
    #[error("invalid enum value {received}: {msg}")]
    InvalidEnumValue {
        /// The raw value read from the wire.
        received: u16,
        /// What was being decoded.
        msg: &'static str,
    },
    /// Structurally invalid data.
    #[error("parse failed: {0}")]
    ParseFailed(&'static str),
}

/// Objects that can be serialized into the consensus encoding.
pub trait Encodable {
    /// Encodes `self` into `writer`, returning the number of bytes written.
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error>;
}

/// Objects that can be deserialized from the consensus encoding.
pub trait Decodable: Sized {
    /// Decodes a value from `reader`.
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error>;
}

/// Serializes an object into a fresh byte vector.
pub fn serialize<T: Encodable + ?Sized>(data: &T) -> Vec<u8> {
    let mut encoder = Vec::new();
    let len = data.consensus_encode(&mut encoder).expect("in-memory writers do not fail");
    debug_assert_eq!(len, encoder.len());
    encoder
}

/// Deserializes an object from a byte slice, rejecting trailing bytes.
pub fn deserialize<T: Decodable>(data: &[u8]) -> Result<T, Error> {
    let (rv, consumed) = deserialize_partial(data)?;
    if consumed == data.len() {
        Ok(rv)
    } else {
        Err(Error::ParseFailed("data not consumed entirely when explicitly deserializing"))
    }
}

/// Deserializes an object from the front of a byte slice, returning it
/// together with the number of bytes consumed.
pub fn deserialize_partial<T: Decodable>(data: &[u8]) -> Result<(T, usize), Error> {
    let mut decoder = Cursor::new(data);
    let rv = Decodable::consensus_decode(&mut decoder)?;
    Ok((rv, decoder.position() as usize))
}

macro_rules! impl_int_encodable {
    ($ty:ident) => {
        impl Encodable for $ty {
            #[inline]
            fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
                writer.write_all(&self.to_le_bytes())?;
                Ok(core::mem::size_of::<$ty>())
            }
        }

        impl Decodable for $ty {
            #[inline]
            fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
                let mut buf = [0u8; core::mem::size_of::<$ty>()];
                reader.read_exact(&mut buf)?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        }
    };
}

impl_int_encodable!(u8);
impl_int_encodable!(u16);
impl_int_encodable!(u32);
impl_int_encodable!(u64);
impl_int_encodable!(i16);
impl_int_encodable!(i32);

impl Encodable for bool {
    #[inline]
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        (*self as u8).consensus_encode(writer)
    }
}

impl Decodable for bool {
    #[inline]
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        Ok(u8::consensus_decode(reader)? != 0)
    }
}

macro_rules! impl_array_encodable {
    ($size:expr) => {
        impl Encodable for [u8; $size] {
            #[inline]
            fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
                writer.write_all(self)?;
                Ok($size)
            }
        }

        impl Decodable for [u8; $size] {
            #[inline]
            fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
                let mut buf = [0u8; $size];
                reader.read_exact(&mut buf)?;
                Ok(buf)
            }
        }
    };
}

impl_array_encodable!(4);
impl_array_encodable!(16);
impl_array_encodable!(20);
impl_array_encodable!(32);
impl_array_encodable!(48);
impl_array_encodable!(96);

/// A compact-size unsigned integer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct VarInt(pub u64);

impl VarInt {
    /// The number of bytes this integer occupies on the wire.
    pub fn len(&self) -> usize {
        match self.0 {
            0..=0xFC => 1,
            0xFD..=0xFFFF => 3,
            0x10000..=0xFFFFFFFF => 5,
            _ => 9,
        }
    }
}

impl Encodable for VarInt {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        match self.0 {
            0..=0xFC => {
                (self.0 as u8).consensus_encode(writer)?;
                Ok(1)
            }
            0xFD..=0xFFFF => {
                writer.write_all(&[0xFD])?;
                (self.0 as u16).consensus_encode(writer)?;
                Ok(3)
            }
            0x10000..=0xFFFFFFFF => {
                writer.write_all(&[0xFE])?;
                (self.0 as u32).consensus_encode(writer)?;
                Ok(5)
            }
            _ => {
                writer.write_all(&[0xFF])?;
                self.0.consensus_encode(writer)?;
                Ok(9)
            }
        }
    }
}

impl Decodable for VarInt {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        let marker = u8::consensus_decode(reader)?;
        match marker {
            0xFF => {
                let x = u64::consensus_decode(reader)?;
                if x < 0x100000000 {
                    Err(Error::NonMinimalVarInt)
                } else {
                    Ok(VarInt(x))
                }
            }
            0xFE => {
                let x = u32::consensus_decode(reader)?;
                if x < 0x10000 {
                    Err(Error::NonMinimalVarInt)
                } else {
                    Ok(VarInt(x as u64))
                }
            }
            0xFD => {
                let x = u16::consensus_decode(reader)?;
                if x < 0xFD {
                    Err(Error::NonMinimalVarInt)
                } else {
                    Ok(VarInt(x as u64))
                }
            }
            n => Ok(VarInt(n as u64)),
        }
    }
}

impl Encodable for Vec<u8> {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        let len = VarInt(self.len() as u64).consensus_encode(writer)?;
        writer.write_all(self)?;
        Ok(len + self.len())
    }
}

impl Decodable for Vec<u8> {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        let len = VarInt::consensus_decode(reader)?.0 as usize;
        if len > MAX_VEC_SIZE {
            return Err(Error::OversizedVectorAllocation { requested: len, max: MAX_VEC_SIZE });
        }
        let mut ret = vec![0u8; len];
        reader.read_exact(&mut ret)?;
        Ok(ret)
    }
}

macro_rules! impl_vec_encodable {
    ($ty:ty) => {
        impl Encodable for Vec<$ty> {
            fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
                let mut len = VarInt(self.len() as u64).consensus_encode(writer)?;
                for element in self {
                    len += element.consensus_encode(writer)?;
                }
                Ok(len)
            }
        }

        impl Decodable for Vec<$ty> {
            fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
                let count = VarInt::consensus_decode(reader)?.0;
                // Size check before any allocation; the in-memory size is a
                // lower bound on the wire size for every element type here.
                let requested = (count as usize)
                    .checked_mul(core::mem::size_of::<$ty>())
                    .ok_or(Error::ParseFailed("invalid collection count"))?;
                if requested > MAX_VEC_SIZE {
                    return Err(Error::OversizedVectorAllocation {
                        requested,
                        max: MAX_VEC_SIZE,
                    });
                }
                let mut ret = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    ret.push(Decodable::consensus_decode(reader)?);
                }
                Ok(ret)
            }
        }
    };
}

impl_vec_encodable!(crate::hash_types::TxMerkleNode);
impl_vec_encodable!(crate::hash_types::ProTxHash);
impl_vec_encodable!(TxIn);
impl_vec_encodable!(TxOut);
impl_vec_encodable!(MasternodeListEntry);
impl_vec_encodable!(QuorumEntry);
impl_vec_encodable!(QuorumIdentifier);

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::hash_types::ProTxHash;

    #[test]
    fn varint_round_trip() {
        for value in [0u64, 1, 0xFC, 0xFD, 0xFFFF, 0x10000, 0xFFFFFFFF, 0x100000000, u64::MAX] {
            let encoded = serialize(&VarInt(value));
            assert_eq!(encoded.len(), VarInt(value).len());
            let decoded: VarInt = deserialize(&encoded).unwrap();
            assert_eq!(decoded.0, value);
        }
    }

    #[test]
    fn varint_rejects_non_minimal() {
        // 0xFD prefix carrying a value that fits in a single byte.
        assert_matches!(deserialize::<VarInt>(&[0xFD, 0x10, 0x00]), Err(Error::NonMinimalVarInt));
        // 0xFE prefix carrying a value that fits in two bytes.
        assert_matches!(
            deserialize::<VarInt>(&[0xFE, 0xFF, 0xFF, 0x00, 0x00]),
            Err(Error::NonMinimalVarInt)
        );
    }

    #[test]
    fn oversized_count_rejected_before_allocation() {
        // A 9-byte compact size declaring ~2^56 hashes, followed by nothing.
        let mut data = vec![0xFF];
        data.extend_from_slice(&0x0100_0000_0000_0000u64.to_le_bytes());
        assert_matches!(
            deserialize::<Vec<ProTxHash>>(&data),
            Err(Error::OversizedVectorAllocation { .. })
        );
    }

    #[test]
    fn deserialize_rejects_trailing_bytes() {
        let mut data = serialize(&42u32);
        data.push(0);
        assert_matches!(deserialize::<u32>(&data), Err(Error::ParseFailed(_)));
    }

    #[test]
    fn byte_vector_round_trip() {
        let payload = vec![7u8; 300];
        let encoded = serialize(&payload);
        assert_eq!(encoded.len(), 3 + 300);
        assert_eq!(deserialize::<Vec<u8>>(&encoded).unwrap(), payload);
    }
}
