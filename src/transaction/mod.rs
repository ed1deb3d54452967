//! Transactions, as far as this crate needs them.
//!
//! The only transactions that reach this code are the coinbase transactions
//! embedded in list diffs, so the model is a special-transaction-capable
//! transaction whose recognized extra payload is the coinbase payload.
//! Scripts stay opaque byte strings.

pub mod coinbase;

use hashes::{Hash, sha256d};

use crate::consensus::{Decodable, Encodable, deserialize, encode, serialize};
use crate::hash_types::Txid;
use crate::internal_macros::impl_consensus_encoding;
use crate::transaction::coinbase::CoinbasePayload;

/// Transaction version from which the extra payload exists.
pub const SPECIAL_TRANSACTION_VERSION: u16 = 3;

/// The special-transaction type of a coinbase transaction.
pub const COINBASE_TRANSACTION_TYPE: u16 = 5;

/// A reference to an output of a previous transaction.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct OutPoint {
    /// The transaction being spent.
    pub txid: Txid,
    /// The index of the spent output.
    pub vout: u32,
}

impl OutPoint {
    /// The null outpoint used by coinbase inputs.
    pub fn null() -> Self {
        OutPoint { txid: Txid::all_zeros(), vout: u32::MAX }
    }

    /// Whether this is the coinbase null outpoint.
    pub fn is_null(&self) -> bool {
        *self == OutPoint::null()
    }
}

impl_consensus_encoding!(OutPoint, txid, vout);

/// A transaction input.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct TxIn {
    /// The output being spent; null for coinbase inputs.
    pub previous_output: OutPoint,
    /// The unlocking script, kept opaque.
    pub script_sig: Vec<u8>,
    /// Input sequence number.
    pub sequence: u32,
}

impl_consensus_encoding!(TxIn, previous_output, script_sig, sequence);

/// A transaction output.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct TxOut {
    /// Amount in the smallest currency unit.
    pub value: u64,
    /// The locking script, kept opaque.
    pub script_pubkey: Vec<u8>,
}

impl_consensus_encoding!(TxOut, value, script_pubkey);

/// Decoded extra payload of a special transaction.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum TransactionPayload {
    /// The coinbase payload carrying the list commitments.
    Coinbase(CoinbasePayload),
}

/// A transaction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transaction {
    /// Serialization version, lower half of the packed version word.
    pub version: u16,
    /// Special-transaction type, upper half of the packed version word;
    /// zero for classical transactions.
    pub tx_type: u16,
    /// Inputs.
    pub input: Vec<TxIn>,
    /// Outputs.
    pub output: Vec<TxOut>,
    /// Lock time.
    pub lock_time: u32,
    /// The decoded extra payload, present when `tx_type` is non-zero.
    pub special_transaction_payload: Option<TransactionPayload>,
}

impl Transaction {
    /// The double-SHA256 of this transaction's serialization.
    pub fn txid(&self) -> Txid {
        Txid::from_byte_array(sha256d::Hash::hash(&serialize(self)).to_byte_array())
    }

    /// Whether the transaction has the shape of a coinbase: a single input
    /// spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.input.len() == 1 && self.input[0].previous_output.is_null()
    }

    /// The coinbase payload, if this is a coinbase special transaction.
    pub fn coinbase_payload(&self) -> Option<&CoinbasePayload> {
        match &self.special_transaction_payload {
            Some(TransactionPayload::Coinbase(payload)) => Some(payload),
            None => None,
        }
    }
}

impl Encodable for Transaction {
    fn consensus_encode<W: std::io::Write + ?Sized>(
        &self,
        writer: &mut W,
    ) -> Result<usize, std::io::Error> {
        let packed_version = (self.version as u32) | ((self.tx_type as u32) << 16);
        let mut len = packed_version.consensus_encode(writer)?;
        len += self.input.consensus_encode(writer)?;
        len += self.output.consensus_encode(writer)?;
        len += self.lock_time.consensus_encode(writer)?;
        if self.tx_type != 0 {
            let payload = match &self.special_transaction_payload {
                Some(TransactionPayload::Coinbase(payload)) => serialize(payload),
                None => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "special transaction without payload",
                    ));
                }
            };
            len += payload.consensus_encode(writer)?;
        }
        Ok(len)
    }
}

impl Decodable for Transaction {
    fn consensus_decode<R: std::io::Read + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, encode::Error> {
        let packed_version = u32::consensus_decode(reader)?;
        let version = (packed_version & 0xFFFF) as u16;
        let tx_type = (packed_version >> 16) as u16;
        let input = Vec::<TxIn>::consensus_decode(reader)?;
        let output = Vec::<TxOut>::consensus_decode(reader)?;
        let lock_time = u32::consensus_decode(reader)?;
        let special_transaction_payload = if tx_type != 0 {
            let raw = Vec::<u8>::consensus_decode(reader)?;
            match tx_type {
                COINBASE_TRANSACTION_TYPE => {
                    Some(TransactionPayload::Coinbase(deserialize(&raw)?))
                }
                other => return Err(encode::Error::UnsupportedSpecialTransaction(other)),
            }
        } else {
            None
        };
        Ok(Transaction {
            version,
            tx_type,
            input,
            output,
            lock_time,
            special_transaction_payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hashes::Hash;

    use super::*;
    use crate::hash_types::MerkleRootMasternodeList;
    use crate::hash_types::MerkleRootQuorums;

    fn coinbase_tx(payload: CoinbasePayload) -> Transaction {
        Transaction {
            version: SPECIAL_TRANSACTION_VERSION,
            tx_type: COINBASE_TRANSACTION_TYPE,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig: vec![0x51],
                sequence: u32::MAX,
            }],
            output: vec![TxOut { value: 5_000_000_000, script_pubkey: vec![0x6A] }],
            lock_time: 0,
            special_transaction_payload: Some(TransactionPayload::Coinbase(payload)),
        }
    }

    fn payload() -> CoinbasePayload {
        CoinbasePayload {
            version: 2,
            height: 4242,
            merkle_root_masternode_list: MerkleRootMasternodeList::hash(b"mn"),
            merkle_root_quorums: MerkleRootQuorums::hash(b"q"),
            best_cl_height: None,
            best_cl_signature: None,
            asset_locked_amount: None,
        }
    }

    #[test]
    fn coinbase_round_trip() {
        let tx = coinbase_tx(payload());
        let encoded = serialize(&tx);
        let decoded: Transaction = deserialize(&encoded).unwrap();
        assert_eq!(decoded, tx);
        assert!(decoded.is_coinbase());
        assert_eq!(decoded.coinbase_payload().unwrap().height, 4242);
        assert_eq!(decoded.txid(), tx.txid());
    }

    #[test]
    fn unknown_special_type_rejected() {
        // Serialize a valid coinbase, then patch the packed version word to
        // claim an unhandled special-transaction type.
        let mut encoded = serialize(&coinbase_tx(payload()));
        let packed = (SPECIAL_TRANSACTION_VERSION as u32) | (9u32 << 16);
        encoded[..4].copy_from_slice(&packed.to_le_bytes());
        assert_matches!(
            deserialize::<Transaction>(&encoded),
            Err(encode::Error::UnsupportedSpecialTransaction(9))
        );
    }

    #[test]
    fn classical_transaction_has_no_payload() {
        let tx = Transaction {
            version: 2,
            tx_type: 0,
            input: vec![TxIn {
                previous_output: OutPoint { txid: Txid::hash(b"prev"), vout: 1 },
                script_sig: vec![],
                sequence: 0xFFFF_FFFE,
            }],
            output: vec![TxOut { value: 1, script_pubkey: vec![0x00] }],
            lock_time: 100,
            special_transaction_payload: None,
        };
        let decoded: Transaction = deserialize(&serialize(&tx)).unwrap();
        assert_eq!(decoded, tx);
        assert!(decoded.coinbase_payload().is_none());
    }
}
