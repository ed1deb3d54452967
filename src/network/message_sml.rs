//! The masternode-list diff request/response pair.

use std::io::{Read, Write};

use crate::consensus::{Decodable, Encodable, encode};
use crate::error::VerificationError;
use crate::hash_types::{BlockHash, ProTxHash, QuorumHash};
use crate::internal_macros::impl_consensus_encoding;
use crate::merkle_tree::PartialMerkleTree;
use crate::sml::masternode_list_entry::MasternodeListEntry;
use crate::sml::quorum_entry::QuorumEntry;
use crate::transaction::coinbase::CoinbasePayload;
use crate::transaction::{SPECIAL_TRANSACTION_VERSION, Transaction};

/// Requests a diff of the masternode list between two blocks.
///
/// An all-zero `base_block_hash` requests the full list at `block_hash`.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct GetMnListDiff {
    /// The block the requester's list is anchored to.
    pub base_block_hash: BlockHash,
    /// The block the requester wants to advance to.
    pub block_hash: BlockHash,
}

impl_consensus_encoding!(GetMnListDiff, base_block_hash, block_hash);

/// Names one quorum deleted by a diff.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct QuorumIdentifier {
    /// Raw quorum class.
    pub llmq_type: u8,
    /// The quorum's defining block hash.
    pub quorum_hash: QuorumHash,
}

impl_consensus_encoding!(QuorumIdentifier, llmq_type, quorum_hash);

/// The diff transforming the masternode list anchored at `base_block_hash`
/// into the one anchored at `block_hash`.
///
/// Transient: received, applied, discarded. Never persisted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MnListDiff {
    /// The block the diff transitions from.
    pub base_block_hash: BlockHash,
    /// The block the diff transitions to.
    pub block_hash: BlockHash,
    /// Proof that `coinbase_tx` is part of the target block.
    pub cb_tx_merkle_tree: PartialMerkleTree,
    /// The target block's coinbase transaction, carrying the commitments.
    pub coinbase_tx: Transaction,
    /// Registrations to remove.
    pub deleted_masternodes: Vec<ProTxHash>,
    /// Entries to insert or replace.
    pub new_masternodes: Vec<MasternodeListEntry>,
    /// Quorums to remove; present only when the coinbase payload commits to
    /// quorums.
    pub deleted_quorums: Vec<QuorumIdentifier>,
    /// Quorum commitments to add; same presence rule.
    pub new_quorums: Vec<QuorumEntry>,
}

impl MnListDiff {
    /// Whether the diff changes the lists at all, as opposed to only moving
    /// the anchor forward.
    pub fn has_changes(&self) -> bool {
        !self.deleted_masternodes.is_empty()
            || !self.new_masternodes.is_empty()
            || !self.deleted_quorums.is_empty()
            || !self.new_quorums.is_empty()
    }

    /// The coinbase payload, after checking the transaction is a sufficiently
    /// recent coinbase special transaction.
    pub fn coinbase_payload(&self) -> Result<&CoinbasePayload, VerificationError> {
        if self.coinbase_tx.version < SPECIAL_TRANSACTION_VERSION {
            return Err(VerificationError::ProtocolVersionMismatch(self.coinbase_tx.version));
        }
        if !self.coinbase_tx.is_coinbase() {
            return Err(VerificationError::MissingCoinbasePayload);
        }
        self.coinbase_tx.coinbase_payload().ok_or(VerificationError::MissingCoinbasePayload)
    }

    /// Replays the Merkle proof and checks that it covers the coinbase
    /// transaction.
    pub fn verify_coinbase_inclusion(&self) -> Result<(), VerificationError> {
        let mut matches = Vec::new();
        let mut indexes = Vec::new();
        self.cb_tx_merkle_tree.extract_matches(&mut matches, &mut indexes)?;
        if !matches.contains(&self.coinbase_tx.txid()) {
            return Err(VerificationError::CoinbaseNotInProof);
        }
        Ok(())
    }
}

impl Encodable for MnListDiff {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut len = 0;
        len += self.base_block_hash.consensus_encode(writer)?;
        len += self.block_hash.consensus_encode(writer)?;
        len += self.cb_tx_merkle_tree.consensus_encode(writer)?;
        len += self.coinbase_tx.consensus_encode(writer)?;
        len += self.deleted_masternodes.consensus_encode(writer)?;
        len += self.new_masternodes.consensus_encode(writer)?;
        let commits_to_quorums = self
            .coinbase_tx
            .coinbase_payload()
            .is_some_and(CoinbasePayload::commits_to_quorums);
        if commits_to_quorums {
            len += self.deleted_quorums.consensus_encode(writer)?;
            len += self.new_quorums.consensus_encode(writer)?;
        } else if !self.deleted_quorums.is_empty() || !self.new_quorums.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "quorum sections present but coinbase payload does not commit to quorums",
            ));
        }
        Ok(len)
    }
}

impl Decodable for MnListDiff {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let base_block_hash = BlockHash::consensus_decode(reader)?;
        let block_hash = BlockHash::consensus_decode(reader)?;
        let cb_tx_merkle_tree = PartialMerkleTree::consensus_decode(reader)?;
        let coinbase_tx = Transaction::consensus_decode(reader)?;
        let deleted_masternodes = Vec::<ProTxHash>::consensus_decode(reader)?;
        let new_masternodes = Vec::<MasternodeListEntry>::consensus_decode(reader)?;
        let commits_to_quorums =
            coinbase_tx.coinbase_payload().is_some_and(CoinbasePayload::commits_to_quorums);
        let (deleted_quorums, new_quorums) = if commits_to_quorums {
            (
                Vec::<QuorumIdentifier>::consensus_decode(reader)?,
                Vec::<QuorumEntry>::consensus_decode(reader)?,
            )
        } else {
            (Vec::new(), Vec::new())
        };
        Ok(MnListDiff {
            base_block_hash,
            block_hash,
            cb_tx_merkle_tree,
            coinbase_tx,
            deleted_masternodes,
            new_masternodes,
            deleted_quorums,
            new_quorums,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;
    use hashes::Hash;

    use super::*;
    use crate::consensus::{VarInt, deserialize, serialize};
    use crate::hash_types::{MerkleRootMasternodeList, MerkleRootQuorums, Txid};
    use crate::merkle_tree::PartialMerkleTree;
    use crate::sml::llmq_type::LLMQType;
    use crate::sml::masternode_list_entry::tests::entry;
    use crate::sml::quorum_entry::tests::commitment;
    use crate::transaction::{
        COINBASE_TRANSACTION_TYPE, OutPoint, TransactionPayload, TxIn, TxOut,
    };

    /// A coinbase transaction carrying `payload`, with a spendable shape.
    pub(crate) fn coinbase_tx(payload: CoinbasePayload) -> Transaction {
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

    /// A diff whose commitments are arbitrary; good enough for codec and
    /// list-manipulation tests that never verify roots.
    pub(crate) fn diff_with_entries(
        base_block_hash: BlockHash,
        block_hash: BlockHash,
        height: u32,
        new_masternodes: Vec<MasternodeListEntry>,
        deleted_masternodes: Vec<ProTxHash>,
    ) -> MnListDiff {
        let payload = CoinbasePayload {
            version: 2,
            height,
            merkle_root_masternode_list: MerkleRootMasternodeList::all_zeros(),
            merkle_root_quorums: MerkleRootQuorums::all_zeros(),
            best_cl_height: None,
            best_cl_signature: None,
            asset_locked_amount: None,
        };
        let coinbase_tx = coinbase_tx(payload);
        let cb_tx_merkle_tree =
            PartialMerkleTree::from_txids(&[coinbase_tx.txid()], &[true]);
        MnListDiff {
            base_block_hash,
            block_hash,
            cb_tx_merkle_tree,
            coinbase_tx,
            deleted_masternodes,
            new_masternodes,
            deleted_quorums: Vec::new(),
            new_quorums: Vec::new(),
        }
    }

    /// Like [`diff_with_entries`], with quorum sections.
    pub(crate) fn diff_with_quorums(
        base_block_hash: BlockHash,
        block_hash: BlockHash,
        height: u32,
        new_quorums: Vec<QuorumEntry>,
        deleted_quorums: Vec<QuorumIdentifier>,
    ) -> MnListDiff {
        let mut diff = diff_with_entries(base_block_hash, block_hash, height, vec![], vec![]);
        diff.new_quorums = new_quorums;
        diff.deleted_quorums = deleted_quorums;
        diff
    }

    #[test]
    fn request_is_sixty_four_bytes() {
        let request = GetMnListDiff {
            base_block_hash: BlockHash::hash(b"base"),
            block_hash: BlockHash::hash(b"target"),
        };
        let encoded = serialize(&request);
        assert_eq!(encoded.len(), 64);
        assert_eq!(deserialize::<GetMnListDiff>(&encoded).unwrap(), request);
    }

    #[test]
    fn diff_round_trip_with_quorum_sections() {
        let diff = {
            let mut diff = diff_with_entries(
                BlockHash::all_zeros(),
                BlockHash::hash(b"h1"),
                1,
                vec![entry(1, true), entry(2, false)],
                vec![ProTxHash::hash(b"gone")],
            );
            diff.new_quorums = vec![commitment(1, LLMQType::LlmqtypeTest)];
            diff.deleted_quorums = vec![QuorumIdentifier {
                llmq_type: LLMQType::LlmqtypeTest.into(),
                quorum_hash: QuorumHash::hash(b"old quorum"),
            }];
            diff
        };
        let decoded: MnListDiff = deserialize(&serialize(&diff)).unwrap();
        assert_eq!(decoded, diff);
        assert!(decoded.has_changes());
        assert!(decoded.coinbase_payload().is_ok());
        assert!(decoded.verify_coinbase_inclusion().is_ok());
    }

    #[test]
    fn version_one_payload_has_no_quorum_sections() {
        let mut diff = diff_with_entries(
            BlockHash::all_zeros(),
            BlockHash::hash(b"h1"),
            1,
            vec![entry(1, true)],
            vec![],
        );
        // Downgrade the payload to version 1.
        let payload = CoinbasePayload {
            version: 1,
            ..diff.coinbase_payload().unwrap().clone()
        };
        diff.coinbase_tx = coinbase_tx(payload);
        diff.cb_tx_merkle_tree =
            PartialMerkleTree::from_txids(&[diff.coinbase_tx.txid()], &[true]);

        let encoded = serialize(&diff);
        let decoded: MnListDiff = deserialize(&encoded).unwrap();
        assert_eq!(decoded, diff);
        assert!(decoded.deleted_quorums.is_empty());

        // Appending quorum bytes to a v1 diff must be rejected as trailing
        // garbage, not silently read.
        let mut with_extra = encoded.clone();
        with_extra.extend_from_slice(&serialize(&VarInt(0)));
        assert!(deserialize::<MnListDiff>(&with_extra).is_err());
    }

    #[test]
    fn hostile_entry_count_rejected() {
        let valid = diff_with_entries(
            BlockHash::all_zeros(),
            BlockHash::hash(b"h1"),
            1,
            vec![],
            vec![],
        );
        // Everything up to the deleted-masternodes count, then a 9-byte
        // varint declaring 2^40 deleted hashes.
        let prefix_len = serialize(&valid.base_block_hash).len()
            + serialize(&valid.block_hash).len()
            + serialize(&valid.cb_tx_merkle_tree).len()
            + serialize(&valid.coinbase_tx).len();
        let mut hostile = serialize(&valid)[..prefix_len].to_vec();
        hostile.push(0xFF);
        hostile.extend_from_slice(&(1u64 << 40).to_le_bytes());
        assert_matches!(
            deserialize::<MnListDiff>(&hostile),
            Err(encode::Error::OversizedVectorAllocation { .. })
        );
    }

    #[test]
    fn no_op_diff_reports_no_changes() {
        let diff = diff_with_entries(
            BlockHash::hash(b"h1"),
            BlockHash::hash(b"h2"),
            2,
            vec![],
            vec![],
        );
        assert!(!diff.has_changes());
    }

    #[test]
    fn wrong_coinbase_txid_fails_inclusion() {
        let mut diff = diff_with_entries(
            BlockHash::all_zeros(),
            BlockHash::hash(b"h1"),
            1,
            vec![],
            vec![],
        );
        diff.cb_tx_merkle_tree =
            PartialMerkleTree::from_txids(&[Txid::hash(b"some other tx")], &[true]);
        assert_matches!(
            diff.verify_coinbase_inclusion(),
            Err(VerificationError::CoinbaseNotInProof)
        );
    }

    #[test]
    fn low_version_coinbase_rejected() {
        let mut diff = diff_with_entries(
            BlockHash::all_zeros(),
            BlockHash::hash(b"h1"),
            1,
            vec![],
            vec![],
        );
        diff.coinbase_tx.version = 2;
        diff.coinbase_tx.special_transaction_payload = None;
        diff.coinbase_tx.tx_type = 0;
        assert_matches!(
            diff.coinbase_payload(),
            Err(VerificationError::ProtocolVersionMismatch(2))
        );
    }
}
