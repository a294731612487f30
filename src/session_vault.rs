//! SessionVault: encrypted session cache in a single storage slot
//!
//! The slot is either empty or sealed. `store` overwrites it, `clear` empties
//! it, and `retrieve` empties it when the sealed record cannot be opened
//! under the current environment key. There is no other state.
//!
//! Concurrent `store` calls race as last-writer-wins. A purge triggered by a
//! failed `retrieve` can race with a concurrent `store` the same way.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::errors::{VaultError, VaultResult};
use crate::fingerprint::EnvironmentProbe;
use crate::key_derivation::{derive_key, DerivedKey};
use crate::session_encrypt::{decode_record, encode_record, open, seal};
use crate::slot_storage::SlotStorage;

/// Storage key owned by the vault. Nothing else reads or writes it.
pub const SESSION_SLOT_KEY: &str = "storefront.session";

pub struct SessionVault {
    storage: Arc<dyn SlotStorage>,
    environment: Arc<dyn EnvironmentProbe>,
}

impl SessionVault {
    pub fn new(storage: Arc<dyn SlotStorage>, environment: Arc<dyn EnvironmentProbe>) -> Self {
        Self {
            storage,
            environment,
        }
    }

    fn current_key(&self) -> VaultResult<DerivedKey> {
        let fingerprint = self.environment.collect()?;
        Ok(derive_key(&fingerprint))
    }

    /// Seal `payload` into the slot.
    ///
    /// Returns `Ok(false)` when there is no persistent storage or the write
    /// fails. Cipher and serialization failures are returned as errors.
    pub fn store<T: Serialize + ?Sized>(&self, payload: &T) -> VaultResult<bool> {
        match self.try_store(payload) {
            Ok(()) => Ok(true),
            Err(VaultError::EnvironmentUnavailable { capability }) => {
                debug!("Session not stored: {capability} unavailable");
                Ok(false)
            }
            Err(VaultError::Storage { operation, message }) => {
                warn!("Session write failed during {operation}: {message}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Like [`store`](Self::store), but a missing storage capability and a
    /// failed write come back as distinct errors.
    pub fn try_store<T: Serialize + ?Sized>(&self, payload: &T) -> VaultResult<()> {
        if !self.storage.is_available() {
            return Err(VaultError::unavailable("persistent storage"));
        }

        let plaintext = Zeroizing::new(
            serde_json::to_vec(payload)
                .map_err(|e| VaultError::serialization("session payload", e))?,
        );
        let key = self.current_key()?;
        let record = seal(&key, &plaintext)?;

        self.storage.set(SESSION_SLOT_KEY, &encode_record(&record))?;
        debug!("Session sealed ({} bytes)", record.len());
        Ok(())
    }

    /// Open the sealed session.
    ///
    /// An empty slot gives `Ok(None)`. A record that the store cannot decode,
    /// or that fails base64, authentication or JSON parsing, is purged and
    /// also gives `Ok(None)`.
    /// Only cipher failures are returned as errors.
    pub fn retrieve(&self) -> VaultResult<Option<Value>> {
        let encoded = match self.storage.get(SESSION_SLOT_KEY) {
            Ok(Some(encoded)) => encoded,
            Ok(None) => return Ok(None),
            Err(e) if e.is_unrecoverable_record() => {
                warn!("Discarding unreadable session slot: {e}");
                self.clear();
                return Ok(None);
            }
            Err(e) => {
                debug!("Session slot unreadable: {e}");
                return Ok(None);
            }
        };

        match self.open_record(&encoded) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_unrecoverable_record() => {
                warn!("Discarding unreadable session: {e}");
                self.clear();
                Ok(None)
            }
            Err(VaultError::EnvironmentUnavailable { capability }) => {
                debug!("Session not opened: {capability} unavailable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Typed [`retrieve`](Self::retrieve). A payload that does not fit `T`
    /// is purged like unparseable plaintext.
    pub fn retrieve_as<T: DeserializeOwned>(&self) -> VaultResult<Option<T>> {
        let Some(value) = self.retrieve()? else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(typed) => Ok(Some(typed)),
            Err(e) => {
                warn!("Discarding session with unexpected shape: {e}");
                self.clear();
                Ok(None)
            }
        }
    }

    fn open_record(&self, encoded: &str) -> VaultResult<Value> {
        let record = decode_record(encoded)?;
        let key = self.current_key()?;
        let plaintext = open(&key, &record)?;
        serde_json::from_slice(&plaintext).map_err(|e| VaultError::serialization("session plaintext", e))
    }

    /// Empty the slot. Clearing an empty slot succeeds.
    pub fn clear(&self) -> bool {
        match self.storage.remove(SESSION_SLOT_KEY) {
            Ok(()) => true,
            Err(e) => {
                debug!("Session slot not cleared: {e}");
                false
            }
        }
    }

    /// Whether the slot holds anything. Does not try to decrypt it, so a
    /// value the store cannot even decode still counts.
    pub fn has_stored_data(&self) -> bool {
        match self.storage.get(SESSION_SLOT_KEY) {
            Ok(Some(v)) => !v.is_empty(),
            Ok(None) => false,
            Err(e) => e.is_unrecoverable_record(),
        }
    }
}
