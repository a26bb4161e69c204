use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::RwLock, time::Instant};

use crate::services::cache::client::{CacheClient, CacheResult};

// Writes past this many entries first drop everything already expired.
const PURGE_THRESHOLD: usize = 1024;

/// In-process cache with a deadline per entry.
///
/// There is no sweeper: an entry past its deadline is dropped by the read that
/// finds it, or by the purge a write runs once the map outgrows its watermark.
/// Uses `tokio::time::Instant` so paused-clock tests can drive expiry.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<Entries>>,
}

#[derive(Debug)]
struct Entries {
    map: HashMap<String, Entry>,
    // Map size that triggers the next purge.
    purge_at: usize,
}

impl Default for Entries {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            purge_at: PURGE_THRESHOLD,
        }
    }
}

impl Entries {
    fn purge_expired(&mut self, now: Instant) {
        self.map.retain(|_, entry| entry.expires_at > now);
        // Live entries stay; do not rescan until the map has doubled again.
        self.purge_at = (self.map.len() * 2).max(PURGE_THRESHOLD);
    }
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.map.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: re-check under the write lock, a concurrent set may have refreshed it.
        let mut entries = self.entries.write().await;
        if entries.map.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.map.remove(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let entry = Entry {
            value: value.to_string(),
            expires_at: now + ttl,
        };

        let mut entries = self.entries.write().await;
        if entries.map.len() >= entries.purge_at {
            entries.purge_expired(now);
        }
        entries.map.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        let removed = self.entries.write().await.map.remove(key);
        Ok(u64::from(removed.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_is_served_until_deadline_then_dropped() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("k", "v", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get_string("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get_string("k").await.unwrap(), None);
        assert_eq!(cache.entries.read().await.map.len(), 0);
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let cache = MemoryCache::new();
        cache.set_with_ttl("k", "a", Duration::from_secs(5)).await.unwrap();
        cache.set_with_ttl("k", "b", Duration::from_secs(5)).await.unwrap();

        assert_eq!(cache.get_string("k").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn del_reports_removed_count() {
        let cache = MemoryCache::new();
        cache.set_with_ttl("k", "a", Duration::from_secs(5)).await.unwrap();

        assert_eq!(cache.del("k").await.unwrap(), 1);
        assert_eq!(cache.del("k").await.unwrap(), 0);
        assert_eq!(cache.get_string("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_past_the_watermark_purge_expired_entries() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("long", "v", Duration::from_secs(3600))
            .await
            .unwrap();
        for i in 1..PURGE_THRESHOLD {
            cache
                .set_with_ttl(&format!("short-{i}"), "v", Duration::from_secs(10))
                .await
                .unwrap();
        }
        assert_eq!(cache.entries.read().await.map.len(), PURGE_THRESHOLD);

        tokio::time::advance(Duration::from_secs(11)).await;
        cache
            .set_with_ttl("fresh", "v", Duration::from_secs(60))
            .await
            .unwrap();

        let entries = cache.entries.read().await;
        assert_eq!(entries.map.len(), 2);
        assert!(entries.map.contains_key("long"));
        assert!(entries.map.contains_key("fresh"));
        assert_eq!(entries.purge_at, PURGE_THRESHOLD);
    }

    #[tokio::test]
    async fn live_entries_raise_the_watermark() {
        let cache = MemoryCache::new();
        for i in 0..=PURGE_THRESHOLD {
            cache
                .set_with_ttl(&format!("k-{i}"), "v", Duration::from_secs(3600))
                .await
                .unwrap();
        }

        let entries = cache.entries.read().await;
        assert_eq!(entries.map.len(), PURGE_THRESHOLD + 1);
        assert_eq!(entries.purge_at, PURGE_THRESHOLD * 2);
    }
}
