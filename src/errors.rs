//! Error handling for the session vault
//!
//! Vault failures fall into two groups. Platform failures (cipher setup,
//! random source, serialization of the caller's payload) are returned to the
//! caller. Record failures (malformed base64, short records, tag mismatch,
//! unparseable plaintext) mean the stored session can never be opened again;
//! the vault absorbs those by purging the slot.

use thiserror::Error;

/// Main error type for the session vault and its consumers
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Environment unavailable: {capability}")]
    EnvironmentUnavailable { capability: String },

    #[error("Cipher operation failed: {operation}")]
    Cipher { operation: String },

    #[error("Stored session failed authentication")]
    Authentication,

    #[error("Stored session is malformed: {reason}")]
    MalformedStoredData { reason: String },

    #[error("Storage operation failed: {operation} - {message}")]
    Storage { operation: String, message: String },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Network operation failed: {operation}")]
    Network {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Remote endpoint rejected the bearer token")]
    Unauthorized,

    #[error("Remote endpoint returned HTTP {status}: {url}")]
    Http { status: u16, url: String },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for Result with VaultError
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Create an environment-unavailable error
    pub fn unavailable(capability: impl Into<String>) -> Self {
        Self::EnvironmentUnavailable {
            capability: capability.into(),
        }
    }

    /// Create a cipher error
    pub fn cipher(operation: impl Into<String>) -> Self {
        Self::Cipher {
            operation: operation.into(),
        }
    }

    /// Create a malformed-record error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedStoredData {
            reason: reason.into(),
        }
    }

    /// Create a storage error
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            operation: operation.into(),
            source,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// True for failures meaning the stored record can never be opened.
    ///
    /// Plaintext that is not valid JSON shows up here as `Serialization`,
    /// which is why `retrieve` only consults this after the cipher step.
    pub fn is_unrecoverable_record(&self) -> bool {
        matches!(
            self,
            VaultError::Authentication
                | VaultError::MalformedStoredData { .. }
                | VaultError::Serialization { .. }
        )
    }

    /// True for failures worth retrying against a remote endpoint
    pub fn is_network(&self) -> bool {
        matches!(self, VaultError::Network { .. })
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::serialization("json_operation", err)
    }
}

/// Convert from sled errors
impl From<sled::Error> for VaultError {
    fn from(err: sled::Error) -> Self {
        VaultError::storage("sled_operation", err.to_string())
    }
}

/// Convert from std::io errors
impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::io("io_operation", err)
    }
}

/// Convert from reqwest errors
impl From<reqwest::Error> for VaultError {
    fn from(err: reqwest::Error) -> Self {
        VaultError::network("http_request", err)
    }
}

/// Convert from figment errors
impl From<figment::Error> for VaultError {
    fn from(err: figment::Error) -> Self {
        VaultError::config(err.to_string())
    }
}
