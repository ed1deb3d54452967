use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::consensus::{deserialize, serialize};
use crate::error::StorageError;
use crate::storage::{ManagerSnapshot, SnapshotStore};

/// A snapshot store backed by a single file.
///
/// Writes go to a sibling temporary file first and are moved into place with
/// a rename, so a crash mid-write leaves the previous snapshot readable.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// A store writing to `path`. Parent directories must exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSnapshotStore { path: path.into() }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, snapshot: &ManagerSnapshot) -> Result<(), StorageError> {
        let encoded = serialize(snapshot);
        let mut tmp_path = self.path.clone();
        tmp_path.set_extension("tmp");
        fs::write(&tmp_path, &encoded)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!(bytes = encoded.len(), path = %self.path.display(), "snapshot written");
        Ok(())
    }

    fn load(&self) -> Result<Option<ManagerSnapshot>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        deserialize(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Corruption(e.to_string()))
    }
}
