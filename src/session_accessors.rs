//! Current-user and current-admin accessors
//!
//! Both read the vault at most once per cache window, pull the bearer token
//! out of the session, and confirm it against a remote profile endpoint.
//! A cached session is only served while the vault slot is still occupied.
//! A 401 from that endpoint ends the session: the vault slot is cleared, not
//! just the accessor's cache. Network failures are retried by the client and
//! never touch the vault.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config_loader::VaultConfig;
use crate::errors::{VaultError, VaultResult};
use crate::profile_client::ProfileClient;
use crate::session_cache::SessionCache;
use crate::session_payload::SessionPayload;
use crate::session_vault::SessionVault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorScope {
    User,
    Admin,
}

/// Session confirmed by the profile endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSession {
    /// User object as stored in the vault at login.
    pub user: Value,
    /// Profile returned by the remote endpoint.
    pub profile: Value,
    pub token: String,
}

pub struct ProfileAccessor {
    scope: AccessorScope,
    profile_path: String,
    vault: Arc<SessionVault>,
    client: Arc<ProfileClient>,
    cache: SessionCache<CurrentSession>,
}

impl ProfileAccessor {
    pub fn current_user(
        vault: Arc<SessionVault>,
        client: Arc<ProfileClient>,
        profile_path: impl Into<String>,
        cache: SessionCache<CurrentSession>,
    ) -> Self {
        Self {
            scope: AccessorScope::User,
            profile_path: profile_path.into(),
            vault,
            client,
            cache,
        }
    }

    /// Accessor that only answers for sessions whose user has role `admin`.
    pub fn current_admin(
        vault: Arc<SessionVault>,
        client: Arc<ProfileClient>,
        profile_path: impl Into<String>,
        cache: SessionCache<CurrentSession>,
    ) -> Self {
        Self {
            scope: AccessorScope::Admin,
            profile_path: profile_path.into(),
            vault,
            client,
            cache,
        }
    }

    pub fn scope(&self) -> AccessorScope {
        self.scope
    }

    /// Confirmed session, or `None` when logged out.
    pub async fn current(&self) -> VaultResult<Option<CurrentSession>> {
        if let Some(cached) = self.cache.get().await {
            // Another accessor, or a logout, may have emptied the slot.
            if self.vault.has_stored_data() {
                return Ok(Some(cached));
            }
            debug!("Session slot emptied, dropping cached {:?} session", self.scope);
            self.cache.invalidate().await;
            return Ok(None);
        }

        let Some(value) = self.vault.retrieve()? else {
            return Ok(None);
        };
        let payload: SessionPayload = match serde_json::from_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Session payload has no user/token shape: {e}");
                return Ok(None);
            }
        };

        let Some(token) = payload.bearer_token() else {
            return Ok(None);
        };
        if self.scope == AccessorScope::Admin && !payload.is_admin() {
            debug!("Session user is not an admin");
            return Ok(None);
        }

        match self.client.fetch_profile(&self.profile_path, token).await {
            Ok(profile) => {
                let session = CurrentSession {
                    user: payload.user.clone().unwrap_or(Value::Null),
                    profile,
                    token: token.to_string(),
                };
                self.cache.put(session.clone()).await;
                Ok(Some(session))
            }
            Err(VaultError::Unauthorized) => {
                warn!("Bearer token rejected by {}, clearing session", self.profile_path);
                self.cache.invalidate().await;
                self.vault.clear();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Forget the cached session, e.g. on logout.
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}

/// Both accessors over one vault, wired from configuration.
pub struct SessionAccessors {
    pub user: ProfileAccessor,
    pub admin: ProfileAccessor,
}

impl SessionAccessors {
    pub fn from_config(config: &VaultConfig, vault: Arc<SessionVault>) -> VaultResult<Self> {
        let client = Arc::new(ProfileClient::new(&config.api, config.retry.clone())?);
        let ttl = config.cache.ttl();

        Ok(Self {
            user: ProfileAccessor::current_user(
                vault.clone(),
                client.clone(),
                config.api.user_profile_path.clone(),
                SessionCache::new(ttl),
            ),
            admin: ProfileAccessor::current_admin(
                vault,
                client,
                config.api.admin_profile_path.clone(),
                SessionCache::new(ttl),
            ),
        })
    }
}
