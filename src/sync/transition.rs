//! Applying one diff to the pair of lists, all-or-nothing.
//!
//! The quorum list co-evolves with the masternode list and its verification
//! needs the *new* masternode list, so the two applications are one atomic
//! transition: if any verification fails, neither list advances.

use thiserror::Error;

use crate::error::VerificationError;
use crate::hash_types::BlockHash;
use crate::network::message_sml::MnListDiff;
use crate::sml::error::SmlError;
use crate::sml::masternode_list::MasternodeList;
use crate::sml::quorum_list::QuorumList;

/// Why a diff did not produce a transition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// The diff does not connect to the current tip. Expected under
    /// duplicate or reordered delivery; dropped without retry.
    #[error(transparent)]
    Stale(#[from] SmlError),
    /// The diff connects but fails verification; worth a bounded retry.
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

/// The outcome of a verified diff application.
#[derive(Clone, Debug)]
pub struct DiffTransition {
    /// The successor masternode list; `None` when the diff carried no
    /// masternode changes and only the anchor moves.
    pub mn_list: Option<MasternodeList>,
    /// The successor quorum list; `None` when the coinbase payload does not
    /// commit to quorums or nothing changed.
    pub quorum_list: Option<QuorumList>,
    /// The new anchor block.
    pub block_hash: BlockHash,
    /// The new anchor height, from the verified coinbase payload.
    pub height: u32,
    /// Whether the lists structurally changed.
    pub has_changes: bool,
}

/// Applies `diff` to the current lists and verifies every commitment.
///
/// `expected_height` is the target block's height according to the header
/// chain, when the caller knows it; the coinbase payload must agree.
pub fn apply_diff_transition(
    mn_list: &MasternodeList,
    quorum_list: &QuorumList,
    diff: &MnListDiff,
    expected_height: Option<u32>,
) -> Result<DiffTransition, DiffError> {
    // Cheap stale check first: duplicates are routine, not suspicious.
    mn_list.check_connects(diff)?;

    let payload = diff.coinbase_payload()?;
    if let Some(block_height) = expected_height
        && payload.height != block_height
    {
        return Err(VerificationError::CoinbaseHeightMismatch {
            block: block_height,
            coinbase: payload.height,
        }
        .into());
    }
    diff.verify_coinbase_inclusion()?;

    if !diff.has_changes() {
        // Anchor-only move; the unchanged lists must still match the new
        // block's commitments.
        mn_list.verify(payload)?;
        if payload.commits_to_quorums() {
            quorum_list.verify(payload, &[], mn_list)?;
        }
        return Ok(DiffTransition {
            mn_list: None,
            quorum_list: None,
            block_hash: diff.block_hash,
            height: payload.height,
            has_changes: false,
        });
    }

    let new_mn_list = mn_list.apply_diff(diff, payload.height)?;
    new_mn_list.verify(payload)?;

    let new_quorum_list = if payload.commits_to_quorums() {
        let updated = quorum_list.apply_diff(diff).map_err(VerificationError::from)?;
        updated.verify(payload, &diff.new_quorums, &new_mn_list)?;
        Some(updated)
    } else {
        None
    };

    Ok(DiffTransition {
        mn_list: Some(new_mn_list),
        quorum_list: new_quorum_list,
        block_hash: diff.block_hash,
        height: payload.height,
        has_changes: true,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;
    use hashes::Hash;

    use super::*;
    use crate::error::VerificationError;
    use crate::hash_types::{BlockHash, MerkleRootMasternodeList, MerkleRootQuorums, ProTxHash};
    use crate::merkle_tree::PartialMerkleTree;
    use crate::network::message_sml::tests::coinbase_tx;
    use crate::network::message_sml::{MnListDiff, QuorumIdentifier};
    use crate::sml::llmq_type::LLMQType;
    use crate::sml::masternode_list_entry::MasternodeListEntry;
    use crate::sml::masternode_list_entry::tests::entry;
    use crate::sml::quorum_entry::QuorumEntry;
    use crate::sml::quorum_entry::tests::commitment;
    use crate::transaction::coinbase::CoinbasePayload;

    /// Builds a diff whose coinbase commitments match the lists the diff
    /// produces, so it passes verification.
    pub(crate) fn verified_diff(
        mn_list: &MasternodeList,
        quorum_list: &QuorumList,
        block_hash: BlockHash,
        height: u32,
        new_masternodes: Vec<MasternodeListEntry>,
        deleted_masternodes: Vec<ProTxHash>,
        new_quorums: Vec<QuorumEntry>,
        deleted_quorums: Vec<QuorumIdentifier>,
    ) -> MnListDiff {
        let mut draft = MnListDiff {
            base_block_hash: mn_list.block_hash,
            block_hash,
            cb_tx_merkle_tree: PartialMerkleTree::from_txids(&[crate::hash_types::Txid::all_zeros()], &[true]),
            coinbase_tx: coinbase_tx(CoinbasePayload {
                version: 2,
                height,
                merkle_root_masternode_list: MerkleRootMasternodeList::all_zeros(),
                merkle_root_quorums: MerkleRootQuorums::all_zeros(),
                best_cl_height: None,
                best_cl_signature: None,
                asset_locked_amount: None,
            }),
            deleted_masternodes,
            new_masternodes,
            deleted_quorums,
            new_quorums,
        };

        // Compute the commitments over the lists this diff will produce.
        let future_mn_list = mn_list.apply_diff(&draft, height).expect("draft diff must connect");
        let future_quorums = quorum_list.apply_diff(&draft).expect("valid quorum classes");
        let payload = CoinbasePayload {
            version: 2,
            height,
            merkle_root_masternode_list: future_mn_list
                .calculate_merkle_root()
                .unwrap_or(MerkleRootMasternodeList::all_zeros()),
            merkle_root_quorums: future_quorums
                .calculate_merkle_root()
                .unwrap_or(MerkleRootQuorums::all_zeros()),
            best_cl_height: None,
            best_cl_signature: None,
            asset_locked_amount: None,
        };
        draft.coinbase_tx = coinbase_tx(payload);
        draft.cb_tx_merkle_tree =
            PartialMerkleTree::from_txids(&[draft.coinbase_tx.txid()], &[true]);
        draft
    }

    #[test]
    fn empty_to_single_entry() {
        let mn_list = MasternodeList::empty();
        let quorum_list = QuorumList::empty();
        let added = entry(1, true);
        let diff = verified_diff(
            &mn_list,
            &quorum_list,
            BlockHash::hash(b"h1"),
            1,
            vec![added.clone()],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(diff.base_block_hash, BlockHash::all_zeros());

        let transition =
            apply_diff_transition(&mn_list, &quorum_list, &diff, Some(1)).unwrap();
        assert!(transition.has_changes);
        let new_list = transition.mn_list.unwrap();
        assert_eq!(new_list.len(), 1);
        assert_eq!(new_list.block_hash, BlockHash::hash(b"h1"));
        assert_eq!(
            new_list.entry(&added.pro_reg_tx_hash).unwrap().masternode_list_entry,
            added
        );
    }

    #[test]
    fn stale_diff_is_reported_as_stale() {
        let mn_list =
            MasternodeList::from_entries([entry(1, true)], BlockHash::hash(b"h1"), 1);
        let quorum_list = QuorumList::empty();
        let mut diff = verified_diff(
            &mn_list,
            &quorum_list,
            BlockHash::hash(b"h2"),
            2,
            vec![entry(2, true)],
            vec![],
            vec![],
            vec![],
        );
        diff.base_block_hash = BlockHash::hash(b"h0");
        assert_matches!(
            apply_diff_transition(&mn_list, &quorum_list, &diff, Some(2)),
            Err(DiffError::Stale(_))
        );
    }

    #[test]
    fn wrong_commitment_fails_verification() {
        let mn_list = MasternodeList::empty();
        let quorum_list = QuorumList::empty();
        let mut diff = verified_diff(
            &mn_list,
            &quorum_list,
            BlockHash::hash(b"h1"),
            1,
            vec![entry(1, true)],
            vec![],
            vec![],
            vec![],
        );
        // Corrupt the committed root.
        diff.coinbase_tx = coinbase_tx(CoinbasePayload {
            merkle_root_masternode_list: MerkleRootMasternodeList::hash(b"lies"),
            ..diff.coinbase_payload().unwrap().clone()
        });
        diff.cb_tx_merkle_tree =
            PartialMerkleTree::from_txids(&[diff.coinbase_tx.txid()], &[true]);
        assert_matches!(
            apply_diff_transition(&mn_list, &quorum_list, &diff, Some(1)),
            Err(DiffError::Verification(VerificationError::MasternodeListRootMismatch { .. }))
        );
    }

    #[test]
    fn height_mismatch_fails_verification() {
        let mn_list = MasternodeList::empty();
        let quorum_list = QuorumList::empty();
        let diff = verified_diff(
            &mn_list,
            &quorum_list,
            BlockHash::hash(b"h1"),
            7,
            vec![entry(1, true)],
            vec![],
            vec![],
            vec![],
        );
        assert_matches!(
            apply_diff_transition(&mn_list, &quorum_list, &diff, Some(8)),
            Err(DiffError::Verification(VerificationError::CoinbaseHeightMismatch {
                block: 8,
                coinbase: 7
            }))
        );
    }

    #[test]
    fn no_op_diff_moves_only_the_anchor() {
        let mn_list =
            MasternodeList::from_entries([entry(1, true)], BlockHash::hash(b"h1"), 1);
        let quorum_list = QuorumList::empty();
        let diff = verified_diff(
            &mn_list,
            &quorum_list,
            BlockHash::hash(b"h2"),
            2,
            vec![],
            vec![],
            vec![],
            vec![],
        );
        let transition =
            apply_diff_transition(&mn_list, &quorum_list, &diff, Some(2)).unwrap();
        assert!(!transition.has_changes);
        assert!(transition.mn_list.is_none());
        assert!(transition.quorum_list.is_none());
        assert_eq!(transition.block_hash, BlockHash::hash(b"h2"));
        assert_eq!(transition.height, 2);
    }

    #[test]
    fn quorums_advance_in_lockstep() {
        let mn_list = MasternodeList::from_entries(
            [entry(1, true), entry(2, true), entry(3, true)],
            BlockHash::hash(b"h1"),
            1,
        );
        let quorum_list = QuorumList::empty();
        let new_quorum = commitment(1, LLMQType::LlmqtypeTest);
        let diff = verified_diff(
            &mn_list,
            &quorum_list,
            BlockHash::hash(b"h2"),
            2,
            vec![],
            vec![],
            vec![new_quorum.clone()],
            vec![],
        );
        let transition =
            apply_diff_transition(&mn_list, &quorum_list, &diff, Some(2)).unwrap();
        let new_quorums = transition.quorum_list.unwrap();
        assert_eq!(new_quorums.len(), 1);
        assert!(
            new_quorums
                .quorum(LLMQType::LlmqtypeTest, &new_quorum.quorum_hash)
                .is_some()
        );
        // The masternode list advanced too, without structural change to its
        // entries.
        assert!(transition.mn_list.is_some());
        assert_eq!(transition.mn_list.unwrap().len(), 3);
    }

    #[test]
    fn broken_quorum_discards_whole_transition() {
        let mn_list = MasternodeList::from_entries(
            [entry(1, true), entry(2, true), entry(3, true)],
            BlockHash::hash(b"h1"),
            1,
        );
        let quorum_list = QuorumList::empty();
        // A commitment with too few signers: structurally invalid.
        let broken = QuorumEntry {
            signers: vec![true, false, false],
            ..commitment(1, LLMQType::LlmqtypeTest)
        };
        let diff = verified_diff(
            &mn_list,
            &quorum_list,
            BlockHash::hash(b"h2"),
            2,
            vec![entry(4, true)],
            vec![],
            vec![broken],
            vec![],
        );
        assert_matches!(
            apply_diff_transition(&mn_list, &quorum_list, &diff, Some(2)),
            Err(DiffError::Verification(VerificationError::QuorumCommitment(_)))
        );
    }
}
