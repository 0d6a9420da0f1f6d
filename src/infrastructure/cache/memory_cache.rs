//! In-process cache with per-entry TTL.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};

/// Upper bound on cached URL mappings before moka starts evicting.
const MAX_URL_ENTRIES: u64 = 100_000;

#[derive(Debug, Clone)]
struct CachedUrl {
    long_url: String,
    ttl: Duration,
}

/// Expires each mapping after the TTL it was set with.
struct PerEntryTtl;

impl Expiry<String, CachedUrl> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedUrl,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedUrl,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// A process-local [`CacheService`].
///
/// URL mappings live in a moka cache, so expired entries are evicted by its
/// housekeeping rather than waiting for a read. Counters never expire.
/// Intended for tests and single-node development setups without Redis.
pub struct MemoryCache {
    urls: Cache<String, CachedUrl>,
    visits: DashMap<String, i64>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        let urls = Cache::builder()
            .max_capacity(MAX_URL_ENTRIES)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            urls,
            visits: DashMap::new(),
        }
    }

    /// Number of URL mappings still held, after pending evictions have run.
    pub async fn url_count(&self) -> u64 {
        self.urls.run_pending_tasks().await;
        self.urls.entry_count()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        Ok(self.urls.get(short_code).await.map(|cached| cached.long_url))
    }

    async fn set_url(&self, short_code: &str, long_url: &str, ttl: Duration) -> CacheResult<()> {
        self.urls
            .insert(
                short_code.to_string(),
                CachedUrl {
                    long_url: long_url.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn incr_visits(&self, short_code: &str) -> CacheResult<()> {
        *self.visits.entry(short_code.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn read_visits(&self, short_code: &str) -> CacheResult<Option<i64>> {
        Ok(self.visits.get(short_code).map(|count| *count))
    }

    async fn take_visits(&self, short_code: &str) -> CacheResult<i64> {
        Ok(self
            .visits
            .remove(short_code)
            .map(|(_, count)| count)
            .unwrap_or(0))
    }

    async fn restore_visits(&self, short_code: &str, delta: i64) -> CacheResult<()> {
        *self.visits.entry(short_code.to_string()).or_insert(0) += delta;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new();
        cache
            .set_url("abc123", "https://example.com", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get_url("abc123").await.unwrap(),
            Some("https://example.com".to_string())
        );
        assert_eq!(cache.url_count().await, 1);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set_url("abc123", "https://example.com", Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(cache.get_url("abc123").await.unwrap(), None);
        assert_eq!(cache.url_count().await, 0);
    }

    #[tokio::test]
    async fn test_expired_entries_are_evicted_without_reads() {
        let cache = MemoryCache::new();
        for i in 0..10_000 {
            cache
                .set_url(
                    &format!("code{i}"),
                    "https://example.com",
                    Duration::from_millis(1),
                )
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(cache.url_count().await, 0);
    }

    #[tokio::test]
    async fn test_reset_refreshes_ttl() {
        let cache = MemoryCache::new();
        cache
            .set_url("abc123", "https://old.example.com", Duration::from_millis(1))
            .await
            .unwrap();
        cache
            .set_url("abc123", "https://new.example.com", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(
            cache.get_url("abc123").await.unwrap(),
            Some("https://new.example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_counters_are_separate_from_urls() {
        let cache = MemoryCache::new();
        cache.incr_visits("abc123").await.unwrap();
        cache.incr_visits("abc123").await.unwrap();

        assert_eq!(cache.get_url("abc123").await.unwrap(), None);
        assert_eq!(cache.read_visits("abc123").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_take_clears_counter() {
        let cache = MemoryCache::new();
        cache.incr_visits("abc123").await.unwrap();

        assert_eq!(cache.take_visits("abc123").await.unwrap(), 1);
        assert_eq!(cache.take_visits("abc123").await.unwrap(), 0);
        assert_eq!(cache.read_visits("abc123").await.unwrap(), None);

        cache.restore_visits("abc123", 3).await.unwrap();
        assert_eq!(cache.read_visits("abc123").await.unwrap(), Some(3));
    }
}
