use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("moka", MokaCacheWrapper);

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// 按条目各自的 TTL 过期
struct PerEntryExpiry;

impl Expiry<String, Entry> for PerEntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

pub struct MokaCacheWrapper {
    inner: Cache<String, Entry>,
    default_ttl: u64,
}

impl MokaCacheWrapper {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        Ok(Self::with_capacity(
            config.cache.memory.max_capacity,
            config.cache.default_ttl,
        ))
    }

    pub fn with_capacity(max_capacity: u64, default_ttl: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();

        debug!(
            "MokaCacheWrapper initialized with max capacity: {}, default TTL: {}s",
            max_capacity, default_ttl
        );
        Self { inner, default_ttl }
    }
}

#[async_trait]
impl ObjectCache for MokaCacheWrapper {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        match self.inner.get(key).await {
            Some(entry) => CacheResult::Found(entry.value),
            None => {
                debug!("Key not found in cache: {}", key);
                CacheResult::NotFound
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let ttl = if ttl == 0 { self.default_ttl } else { ttl };
        self.inner
            .insert(
                key,
                Entry {
                    value,
                    ttl: Duration::from_secs(ttl),
                },
            )
            .await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let cache = MokaCacheWrapper::with_capacity(100, 60);
        cache.insert_raw("k".into(), "v".into(), 0).await;
        assert_eq!(cache.get_raw("k").await, CacheResult::Found("v".to_string()));

        cache.remove("k").await;
        assert_eq!(cache.get_raw("k").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_per_entry_ttl_expires() {
        let cache = MokaCacheWrapper::with_capacity(100, 60);
        cache.insert_raw("short".into(), "v".into(), 1).await;
        cache.insert_raw("long".into(), "v".into(), 60).await;

        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert_eq!(cache.get_raw("short").await, CacheResult::NotFound);
        assert!(matches!(cache.get_raw("long").await, CacheResult::Found(_)));
    }
}
