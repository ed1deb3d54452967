//! BLS public keys and signatures as opaque byte material.
//!
//! This crate never evaluates BLS signatures; it only moves the 48-byte
//! public keys and 96-byte signatures across the wire and hashes them into
//! commitments, so they are plain fixed-size byte newtypes here.

use core::fmt;
use std::io::{self, Read, Write};

use crate::consensus::{Decodable, Encodable, encode};

/// A BLS public key in its 48-byte compressed serialization.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BLSPublicKey([u8; 48]);

/// A BLS signature in its 96-byte compressed serialization.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BLSSignature([u8; 96]);

impl BLSPublicKey {
    /// Returns the raw serialized bytes.
    pub fn as_bytes(&self) -> &[u8; 48] {
        &self.0
    }
}

impl BLSSignature {
    /// Returns the raw serialized bytes.
    pub fn as_bytes(&self) -> &[u8; 96] {
        &self.0
    }
}

impl From<[u8; 48]> for BLSPublicKey {
    fn from(bytes: [u8; 48]) -> Self {
        BLSPublicKey(bytes)
    }
}

impl From<[u8; 96]> for BLSSignature {
    fn from(bytes: [u8; 96]) -> Self {
        BLSSignature(bytes)
    }
}

impl fmt::Display for BLSPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Display for BLSSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for BLSPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BLSPublicKey({self})")
    }
}

impl fmt::Debug for BLSSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BLSSignature({self})")
    }
}

impl Encodable for BLSPublicKey {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        self.0.consensus_encode(writer)
    }
}

impl Decodable for BLSPublicKey {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        Ok(BLSPublicKey(<[u8; 48]>::consensus_decode(reader)?))
    }
}

impl Encodable for BLSSignature {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        self.0.consensus_encode(writer)
    }
}

impl Decodable for BLSSignature {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        Ok(BLSSignature(<[u8; 96]>::consensus_decode(reader)?))
    }
}
