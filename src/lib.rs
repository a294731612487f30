//! Library root for the `session_vault` crate
//!
//! Encrypted session cache for the storefront and admin console: a session
//! blob (user plus bearer token) sealed with AES-GCM under a key re-derived
//! from environment signals on every use, kept in one storage slot.

// Core error handling
pub mod errors;

// Key material
pub mod fingerprint;
pub mod key_derivation;

// Encryption
pub mod session_encrypt;

// Storage adapters
pub mod slot_storage;
pub mod slot_storage_sled;

// Vault facade
pub mod session_payload;
pub mod session_vault;

// Consumers
pub mod profile_client;
pub mod session_accessors;
pub mod session_cache;

// Configuration & logging
pub mod config_loader;
pub mod log_sink;


pub use errors::{VaultError, VaultResult};
pub use fingerprint::{EnvironmentFingerprint, EnvironmentProbe, HostEnvironment, StaticEnvironment};
pub use session_accessors::{CurrentSession, ProfileAccessor, SessionAccessors};
pub use session_payload::SessionPayload;
pub use session_vault::{SessionVault, SESSION_SLOT_KEY};
pub use slot_storage::{MemoryStorage, SlotStorage, UnavailableStorage};
pub use slot_storage_sled::SledStorage;
