use std::path::Path;

use sled::Db;
use tracing::debug;

use crate::errors::{VaultError, VaultResult};
use crate::slot_storage::SlotStorage;

const TREE_NAME: &str = "session_slots";

/// Persistent slot storage on an embedded sled database.
///
/// Every mutation is flushed, so a stored session survives a restart the
/// way localStorage survives a page reload.
pub struct SledStorage {
    _db: Db,
    tree: sled::Tree,
}

impl SledStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> VaultResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VaultError::io("creating storage directory", e))?;
        }

        let db = sled::open(path)
            .map_err(|e| VaultError::storage("open", format!("{}: {e}", path.display())))?;
        let tree = db.open_tree(TREE_NAME)?;
        debug!("Opened sled slot storage at {}", path.display());
        Ok(Self { _db: db, tree })
    }

    /// Storage in a throwaway sled instance that is deleted on drop.
    pub fn temporary() -> VaultResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let tree = db.open_tree(TREE_NAME)?;
        Ok(Self { _db: db, tree })
    }

    fn flush(&self) -> VaultResult<()> {
        self.tree.flush()?;
        Ok(())
    }
}

impl SlotStorage for SledStorage {
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> VaultResult<Option<String>> {
        match self.tree.get(key)? {
            Some(ivec) => String::from_utf8(ivec.to_vec())
                .map(Some)
                .map_err(|e| VaultError::malformed(format!("non-utf8 value: {e}"))),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> VaultResult<()> {
        self.tree.insert(key, value.as_bytes())?;
        self.flush()
    }

    fn remove(&self, key: &str) -> VaultResult<()> {
        self.tree.remove(key)?;
        self.flush()
    }
}
