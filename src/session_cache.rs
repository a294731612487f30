//! Short-lived in-process cache for session accessors
//!
//! Each accessor owns one of these and is handed it at construction, so
//! nothing is cached in module-level state and tests never share entries.

use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default window before an accessor goes back to the vault and network.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

struct CachedEntry<T> {
    value: T,
    stored_at: Instant,
}

pub struct SessionCache<T> {
    entry: RwLock<Option<CachedEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> SessionCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value, if it is younger than the TTL.
    pub async fn get(&self) -> Option<T> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|cached| cached.stored_at.elapsed() < self.ttl)
            .map(|cached| cached.value.clone())
    }

    pub async fn put(&self, value: T) {
        let mut entry = self.entry.write().await;
        *entry = Some(CachedEntry {
            value,
            stored_at: Instant::now(),
        });
    }

    pub async fn invalidate(&self) {
        self.entry.write().await.take();
    }

    pub async fn is_fresh(&self) -> bool {
        self.get().await.is_some()
    }
}

impl<T: Clone> Default for SessionCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = SessionCache::default();
        cache.put("profile".to_string()).await;

        tokio::time::advance(Duration::from_secs(9 * 60)).await;
        assert_eq!(cache.get().await.as_deref(), Some("profile"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn put_restarts_the_window() {
        let cache = SessionCache::new(Duration::from_secs(60));
        cache.put(1u32).await;
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.put(2u32).await;
        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(cache.get().await, Some(2));
    }

    #[tokio::test]
    async fn invalidate_drops_entry() {
        let cache = SessionCache::default();
        cache.put(7u8).await;
        assert!(cache.is_fresh().await);
        cache.invalidate().await;
        assert!(!cache.is_fresh().await);
    }
}
