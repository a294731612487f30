// Layered configuration: built-in defaults, then session_vault.toml, then
// SESSION_VAULT_* environment variables (nested keys joined with "__").

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::errors::{VaultError, VaultResult};
use crate::fingerprint::{DisplayMetrics, HostEnvironment};
use crate::session_vault::SessionVault;
use crate::slot_storage::{MemoryStorage, SlotStorage, UnavailableStorage};
use crate::slot_storage_sled::SledStorage;

pub const CONFIG_FILE: &str = "session_vault.toml";
pub const ENV_PREFIX: &str = "SESSION_VAULT_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub display: DisplayMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sled,
    Memory,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Defaults to `<data_local_dir>/session_vault/slots`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sled
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
        }
    }
}

impl StorageConfig {
    pub fn resolved_path(&self) -> VaultResult<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("session_vault").join("slots"))
            .ok_or_else(|| VaultError::config("no local data directory; set storage.path"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_profile_path: String,
    pub admin_profile_path: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            user_profile_path: "/api/users/profile".to_string(),
            admin_profile_path: "/api/admin/profile".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// How long network-class failures keep being retried.
    pub window_secs: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            min_delay_ms: 500,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            api: ApiConfig::default(),
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            display: DisplayMetrics::default(),
        }
    }
}

impl VaultConfig {
    pub fn validate(&self) -> VaultResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(VaultError::config("api.base_url must be set"));
        }
        if self.api.timeout_secs == 0 {
            return Err(VaultError::config("api.timeout_secs must be greater than zero"));
        }
        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            return Err(VaultError::config(
                "retry.min_delay_ms cannot exceed retry.max_delay_ms",
            ));
        }
        Ok(())
    }

    /// Open the configured storage backend.
    pub fn build_storage(&self) -> VaultResult<Arc<dyn SlotStorage>> {
        Ok(match self.storage.backend {
            StorageBackend::Sled => Arc::new(SledStorage::open(self.storage.resolved_path()?)?),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
            StorageBackend::None => Arc::new(UnavailableStorage),
        })
    }

    /// A vault over the configured storage, keyed from the host environment.
    pub fn build_vault(&self) -> VaultResult<SessionVault> {
        Ok(SessionVault::new(
            self.build_storage()?,
            Arc::new(HostEnvironment::new(self.display)),
        ))
    }
}

pub fn config_figment() -> Figment {
    Figment::from(Serialized::defaults(VaultConfig::default()))
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn load_config() -> VaultResult<VaultConfig> {
    load_config_from(config_figment())
}

pub fn load_config_from(figment: Figment) -> VaultResult<VaultConfig> {
    let config: VaultConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}
