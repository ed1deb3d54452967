mod hash;
pub mod qualified_masternode_list_entry;
mod score;

use std::cmp::Ordering;
use std::io::{Read, Write};

use hashes::{Hash, sha256d};

use crate::bls_sig_utils::BLSPublicKey;
use crate::consensus::encode::Error;
use crate::consensus::{Decodable, Encodable, serialize};
use crate::hash_types::{ConfirmedHash, ProTxHash, PubkeyHash};
use crate::sml::address::ServiceAddress;

/// Entry serialization version from which the operator key is a BLS public
/// key instead of a legacy 20-byte key id.
pub const ENTRY_VERSION_BLS_OPERATOR: u16 = 2;

/// The operator key of a masternode.
///
/// Which form is in use is decided by the entry's serialization version:
/// networks without extended key support register a key id, networks with it
/// register the full BLS public key.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Hash)]
pub enum OperatorKey {
    /// Hash of the operator's key, entry version 1.
    KeyId(PubkeyHash),
    /// The operator's BLS public key, entry version 2 onwards.
    Bls(BLSPublicKey),
}

impl Encodable for OperatorKey {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        match self {
            OperatorKey::KeyId(key_id) => key_id.consensus_encode(writer),
            OperatorKey::Bls(public_key) => public_key.consensus_encode(writer),
        }
    }
}

/// One registered masternode at a point in time.
///
/// Entries are immutable: a diff updates a masternode by shipping a
/// replacement entry under the same registration hash.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct MasternodeListEntry {
    /// Serialization version; decides the operator key form.
    pub version: u16,
    /// The masternode's identity.
    pub pro_reg_tx_hash: ProTxHash,
    /// Hash of the block that confirmed the registration; `None` until the
    /// registration reaches confirmation depth (all zeros on the wire).
    pub confirmed_hash: Option<ConfirmedHash>,
    /// Where the masternode serves.
    pub service_address: ServiceAddress,
    /// The operator key.
    pub operator_key: OperatorKey,
    /// Hash of the voting key.
    pub key_id_voting: PubkeyHash,
    /// Whether the masternode is currently in good standing.
    pub is_valid: bool,
}

impl Ord for MasternodeListEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pro_reg_tx_hash.cmp(&other.pro_reg_tx_hash)
    }
}

impl PartialOrd for MasternodeListEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl MasternodeListEntry {
    /// Digest of the service address, for the uniqueness index.
    pub fn service_property_hash(&self) -> sha256d::Hash {
        sha256d::Hash::hash(&serialize(&self.service_address))
    }

    /// Digest of the voting key id, for the uniqueness index.
    pub fn voting_key_property_hash(&self) -> sha256d::Hash {
        sha256d::Hash::hash(&serialize(&self.key_id_voting))
    }

    /// Digest of the operator key, for the uniqueness index.
    pub fn operator_key_property_hash(&self) -> sha256d::Hash {
        sha256d::Hash::hash(&serialize(&self.operator_key))
    }

    /// The three digests an entry occupies in the uniqueness index.
    pub fn property_hashes(&self) -> [sha256d::Hash; 3] {
        [
            self.service_property_hash(),
            self.voting_key_property_hash(),
            self.operator_key_property_hash(),
        ]
    }
}

impl Encodable for MasternodeListEntry {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut len = 0;
        len += self.version.consensus_encode(writer)?;
        len += self.pro_reg_tx_hash.consensus_encode(writer)?;
        match self.confirmed_hash {
            Some(confirmed_hash) => len += confirmed_hash.consensus_encode(writer)?,
            None => len += [0u8; 32].consensus_encode(writer)?,
        }
        len += self.service_address.consensus_encode(writer)?;
        match (&self.operator_key, self.version >= ENTRY_VERSION_BLS_OPERATOR) {
            (OperatorKey::KeyId(_), false) | (OperatorKey::Bls(_), true) => {
                len += self.operator_key.consensus_encode(writer)?;
            }
            _ => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "operator key form does not match entry version",
                ));
            }
        }
        len += self.key_id_voting.consensus_encode(writer)?;
        len += self.is_valid.consensus_encode(writer)?;
        Ok(len)
    }
}

impl Decodable for MasternodeListEntry {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        let version: u16 = Decodable::consensus_decode(reader)?;
        let pro_reg_tx_hash: ProTxHash = Decodable::consensus_decode(reader)?;
        let confirmed_hash: ConfirmedHash = Decodable::consensus_decode(reader)?;
        let confirmed_hash =
            if confirmed_hash.to_byte_array() == [0u8; 32] { None } else { Some(confirmed_hash) };
        let service_address: ServiceAddress = Decodable::consensus_decode(reader)?;
        let operator_key = if version >= ENTRY_VERSION_BLS_OPERATOR {
            OperatorKey::Bls(Decodable::consensus_decode(reader)?)
        } else {
            OperatorKey::KeyId(Decodable::consensus_decode(reader)?)
        };
        let key_id_voting: PubkeyHash = Decodable::consensus_decode(reader)?;
        let is_valid: bool = Decodable::consensus_decode(reader)?;
        Ok(MasternodeListEntry {
            version,
            pro_reg_tx_hash,
            confirmed_hash,
            service_address,
            operator_key,
            key_id_voting,
            is_valid,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::net::Ipv4Addr;

    use hashes::Hash;

    use super::*;
    use crate::consensus::{deserialize, serialize};

    pub(crate) fn entry(tag: u8, confirmed: bool) -> MasternodeListEntry {
        MasternodeListEntry {
            version: ENTRY_VERSION_BLS_OPERATOR,
            pro_reg_tx_hash: ProTxHash::hash(&[tag]),
            confirmed_hash: confirmed.then(|| ConfirmedHash::hash(&[tag, 0xC0])),
            service_address: ServiceAddress { ip: Ipv4Addr::new(10, 0, 0, tag), port: 9999 },
            operator_key: OperatorKey::Bls(BLSPublicKey::from([tag; 48])),
            key_id_voting: PubkeyHash::hash(&[tag, 0x40]),
            is_valid: true,
        }
    }

    #[test]
    fn bls_entry_round_trip() {
        let original = entry(3, true);
        let encoded = serialize(&original);
        // 2 + 32 + 32 + 18 + 48 + 20 + 1
        assert_eq!(encoded.len(), 153);
        assert_eq!(deserialize::<MasternodeListEntry>(&encoded).unwrap(), original);
    }

    #[test]
    fn legacy_entry_round_trip() {
        let original = MasternodeListEntry {
            version: 1,
            operator_key: OperatorKey::KeyId(PubkeyHash::hash(b"operator")),
            ..entry(4, true)
        };
        let encoded = serialize(&original);
        // Legacy operator key is 20 bytes instead of 48.
        assert_eq!(encoded.len(), 125);
        assert_eq!(deserialize::<MasternodeListEntry>(&encoded).unwrap(), original);
    }

    #[test]
    fn zero_confirmed_hash_decodes_as_none() {
        let original = entry(5, false);
        let encoded = serialize(&original);
        let decoded: MasternodeListEntry = deserialize(&encoded).unwrap();
        assert_eq!(decoded.confirmed_hash, None);
        assert_eq!(serialize(&decoded), encoded);
    }

    #[test]
    fn mismatched_operator_key_form_rejected_on_encode() {
        let broken = MasternodeListEntry {
            version: 1,
            operator_key: OperatorKey::Bls(BLSPublicKey::from([1; 48])),
            ..entry(6, true)
        };
        assert!(broken.consensus_encode(&mut Vec::new()).is_err());
    }

    #[test]
    fn property_hashes_are_stable_per_field() {
        let a = entry(7, true);
        let mut b = a.clone();
        b.key_id_voting = PubkeyHash::hash(b"different voter");
        assert_eq!(a.service_property_hash(), b.service_property_hash());
        assert_ne!(a.voting_key_property_hash(), b.voting_key_property_hash());
        assert_eq!(a.operator_key_property_hash(), b.operator_key_property_hash());
    }
}
