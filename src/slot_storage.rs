use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::{VaultError, VaultResult};

/// Origin-scoped string key-value store holding the vault's ciphertext.
///
/// Implementations report a missing capability as
/// [`VaultError::EnvironmentUnavailable`] so the vault can degrade quietly.
pub trait SlotStorage: Send + Sync {
    fn is_available(&self) -> bool;

    fn get(&self, key: &str) -> VaultResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> VaultResult<()>;

    /// Removing a missing key succeeds.
    fn remove(&self, key: &str) -> VaultResult<()>;
}

/// In-process storage, the stand-in for a browser's localStorage.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    reject_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose writes fail, as when the origin quota is exhausted.
    pub fn failing_writes() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            reject_writes: true,
        }
    }

    fn lock(&self) -> VaultResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| VaultError::storage("lock", "memory storage mutex poisoned"))
    }
}

impl SlotStorage for MemoryStorage {
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> VaultResult<()> {
        if self.reject_writes {
            return Err(VaultError::storage("set", "storage quota exceeded"));
        }
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> VaultResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Execution context without persistent storage (server-side rendering).
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStorage;

impl SlotStorage for UnavailableStorage {
    fn is_available(&self) -> bool {
        false
    }

    fn get(&self, _key: &str) -> VaultResult<Option<String>> {
        Err(VaultError::unavailable("persistent storage"))
    }

    fn set(&self, _key: &str, _value: &str) -> VaultResult<()> {
        Err(VaultError::unavailable("persistent storage"))
    }

    fn remove(&self, _key: &str) -> VaultResult<()> {
        Err(VaultError::unavailable("persistent storage"))
    }
}
