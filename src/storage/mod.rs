//! Persistence of the manager's state.
//!
//! The snapshot format is the consensus encoding of the masternode list
//! (entries plus uniqueness index), the tip anchor, and — from format
//! version 2 — the quorum list. Loading re-validates the snapshot: entry
//! keys must match their entries and the persisted uniqueness index must
//! equal the one rebuilt from the entries.

mod disk;
mod memory;

pub use disk::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use std::collections::BTreeMap;
use std::io::{Read, Write};

use hashes::{Hash, sha256d};

use crate::consensus::{Decodable, Encodable, VarInt, encode};
use crate::error::StorageError;
use crate::hash_types::BlockHash;
use crate::sml::llmq_type::LLMQType;
use crate::sml::masternode_list::{MasternodeList, PropertyOwnership};
use crate::sml::masternode_list_entry::MasternodeListEntry;
use crate::sml::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;
use crate::sml::quorum_entry::QuorumEntry;
use crate::sml::quorum_list::QuorumList;

/// Snapshot format carrying only the masternode list.
pub const MN_FORMAT_VERSION: u16 = 1;

/// Snapshot format carrying the quorum list as well.
pub const LLMQ_FORMAT_VERSION: u16 = 2;

/// Everything the sync engine persists between runs.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ManagerSnapshot {
    /// Which sections follow; see the format constants.
    pub format_version: u16,
    /// The masternode list at the tip.
    pub mn_list: MasternodeList,
    /// The anchor block hash.
    pub tip_hash: BlockHash,
    /// The anchor height.
    pub tip_height: u32,
    /// The quorum list at the tip; empty under format version 1.
    pub quorum_list: QuorumList,
}

/// Durable storage for manager snapshots.
///
/// Save failures must leave any previous snapshot intact; the engine treats
/// them as lost durability, not lost state.
pub trait SnapshotStore {
    /// Persists a snapshot, replacing any previous one.
    fn save(&self, snapshot: &ManagerSnapshot) -> Result<(), StorageError>;

    /// Loads the last persisted snapshot, or `None` if none exists.
    fn load(&self) -> Result<Option<ManagerSnapshot>, StorageError>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<T> {
    fn save(&self, snapshot: &ManagerSnapshot) -> Result<(), StorageError> {
        (**self).save(snapshot)
    }

    fn load(&self) -> Result<Option<ManagerSnapshot>, StorageError> {
        (**self).load()
    }
}

impl Encodable for MasternodeList {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut len = 0;
        len += self.block_hash.consensus_encode(writer)?;
        len += self.known_height.consensus_encode(writer)?;
        len += VarInt(self.masternodes().len() as u64).consensus_encode(writer)?;
        for (pro_reg_tx_hash, entry) in self.masternodes() {
            len += pro_reg_tx_hash.consensus_encode(writer)?;
            len += entry.masternode_list_entry.consensus_encode(writer)?;
        }
        len += VarInt(self.unique_property_index().len() as u64).consensus_encode(writer)?;
        for (property_hash, ownership) in self.unique_property_index() {
            len += property_hash.to_byte_array().consensus_encode(writer)?;
            len += ownership.owner.consensus_encode(writer)?;
            len += ownership.ref_count.consensus_encode(writer)?;
        }
        Ok(len)
    }
}

impl Decodable for MasternodeList {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let block_hash = BlockHash::consensus_decode(reader)?;
        let known_height = u32::consensus_decode(reader)?;

        let entry_count = VarInt::consensus_decode(reader)?.0;
        let mut masternodes = BTreeMap::new();
        for _ in 0..entry_count {
            let pro_reg_tx_hash = crate::hash_types::ProTxHash::consensus_decode(reader)?;
            let entry = MasternodeListEntry::consensus_decode(reader)?;
            if entry.pro_reg_tx_hash != pro_reg_tx_hash {
                return Err(encode::Error::ParseFailed(
                    "masternode entry keyed under wrong registration hash",
                ));
            }
            masternodes.insert(pro_reg_tx_hash, QualifiedMasternodeListEntry::from(entry));
        }

        let index_count = VarInt::consensus_decode(reader)?.0;
        let mut unique_property_index = BTreeMap::new();
        for _ in 0..index_count {
            let property_hash =
                sha256d::Hash::from_byte_array(<[u8; 32]>::consensus_decode(reader)?);
            let owner = crate::hash_types::ProTxHash::consensus_decode(reader)?;
            let ref_count = u32::consensus_decode(reader)?;
            unique_property_index.insert(property_hash, PropertyOwnership { owner, ref_count });
        }

        let list =
            MasternodeList::restore(block_hash, known_height, masternodes, unique_property_index);
        if list.rebuilt_property_index() != *list.unique_property_index() {
            return Err(encode::Error::ParseFailed(
                "unique property index does not match entries",
            ));
        }
        Ok(list)
    }
}

impl Encodable for QuorumList {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut len = VarInt(self.len() as u64).consensus_encode(writer)?;
        for entry in self.iter() {
            len += entry.quorum_entry.consensus_encode(writer)?;
        }
        Ok(len)
    }
}

impl Decodable for QuorumList {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let count = VarInt::consensus_decode(reader)?.0;
        let mut list = QuorumList::empty();
        for _ in 0..count {
            let entry = QuorumEntry::consensus_decode(reader)?;
            let llmq_type = LLMQType::try_from(entry.llmq_type).map_err(|_| {
                encode::Error::InvalidEnumValue {
                    received: entry.llmq_type as u16,
                    msg: "unknown quorum class in snapshot",
                }
            })?;
            list.insert(llmq_type, entry);
        }
        Ok(list)
    }
}

impl Encodable for ManagerSnapshot {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut len = 0;
        len += self.format_version.consensus_encode(writer)?;
        len += self.mn_list.consensus_encode(writer)?;
        len += self.tip_hash.consensus_encode(writer)?;
        len += self.tip_height.consensus_encode(writer)?;
        if self.format_version >= LLMQ_FORMAT_VERSION {
            len += self.quorum_list.consensus_encode(writer)?;
        }
        Ok(len)
    }
}

impl Decodable for ManagerSnapshot {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let format_version = u16::consensus_decode(reader)?;
        let mn_list = MasternodeList::consensus_decode(reader)?;
        let tip_hash = BlockHash::consensus_decode(reader)?;
        let tip_height = u32::consensus_decode(reader)?;
        let quorum_list = if format_version >= LLMQ_FORMAT_VERSION {
            QuorumList::consensus_decode(reader)?
        } else {
            QuorumList::empty()
        };
        Ok(ManagerSnapshot { format_version, mn_list, tip_hash, tip_height, quorum_list })
    }
}
