use std::sync::Mutex;

use crate::consensus::{deserialize, serialize};
use crate::error::StorageError;
use crate::storage::{ManagerSnapshot, SnapshotStore};

/// An in-memory snapshot store.
///
/// Round-trips snapshots through the serialized form, so it exercises the
/// same codec path as a disk store. The default store for tests and for
/// embeddings that handle durability themselves.
#[derive(Default)]
pub struct MemorySnapshotStore {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemorySnapshotStore {
    /// An empty store.
    pub fn new() -> Self {
        MemorySnapshotStore::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, snapshot: &ManagerSnapshot) -> Result<(), StorageError> {
        let encoded = serialize(snapshot);
        *self.bytes.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(encoded);
        Ok(())
    }

    fn load(&self) -> Result<Option<ManagerSnapshot>, StorageError> {
        let guard = self.bytes.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match guard.as_deref() {
            Some(bytes) => deserialize(bytes)
                .map(Some)
                .map_err(|e| StorageError::Corruption(e.to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use hashes::Hash;

    use super::*;
    use crate::hash_types::BlockHash;
    use crate::sml::masternode_list::MasternodeList;
    use crate::sml::masternode_list_entry::tests::entry;
    use crate::sml::quorum_list::QuorumList;
    use crate::storage::MN_FORMAT_VERSION;

    #[test]
    fn save_then_load() {
        let store = MemorySnapshotStore::new();
        assert!(store.load().unwrap().is_none());

        let snapshot = ManagerSnapshot {
            format_version: MN_FORMAT_VERSION,
            mn_list: MasternodeList::from_entries(
                [entry(1, true)],
                BlockHash::hash(b"t"),
                5,
            ),
            tip_hash: BlockHash::hash(b"t"),
            tip_height: 5,
            quorum_list: QuorumList::empty(),
        };
        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot));
    }
}
