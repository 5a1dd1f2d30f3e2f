//! In-process cache backend
//!
//! Entries carry their own deadline. Expired entries read as misses and are
//! evicted lazily on the next access to the same key, or in bulk by
//! [`InMemoryCacheStore::purge_expired`].

use crate::cache::{CacheError, CacheStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// `HashMap`-backed [`CacheStore`] guarded by an async `RwLock`
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Get cache statistics (for debugging/monitoring)
    pub async fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let live = entries.values().filter(|e| !e.is_expired(now)).count();

        CacheStats {
            live_entries: live,
            expired_entries: entries.len() - live,
            total_bytes: entries.values().map(|e| e.value.len()).sum(),
        }
    }
}

/// Statistics about the in-memory cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub live_entries: usize,
    /// Expired but not yet evicted
    pub expired_entries: usize,
    pub total_bytes: usize,
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict unless a writer refreshed it in the meantime
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::unavailable(format!("ttl {:?} overflows the clock", ttl)))?;

        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCacheStore::new();
        assert_eq!(cache.get("k").await.unwrap(), None);

        cache
            .set_with_expiry("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));

        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);

        // Deleting again is fine
        cache.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_evicted() {
        let cache = InMemoryCacheStore::new();
        cache
            .set_with_expiry("k", b"v".to_vec(), Duration::ZERO)
            .await
            .unwrap();

        let stats = cache.stats().await;
        assert_eq!(stats.live_entries, 0);
        assert_eq!(stats.expired_entries, 1);

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert_eq!(cache.stats().await.expired_entries, 0);
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_entries() {
        let cache = InMemoryCacheStore::new();
        cache
            .set_with_expiry("old", vec![1], Duration::ZERO)
            .await
            .unwrap();
        cache
            .set_with_expiry("new", vec![2, 3], Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.purge_expired().await, 1);
        let stats = cache.stats().await;
        assert_eq!(stats.live_entries, 1);
        assert_eq!(stats.total_bytes, 2);
    }
}
