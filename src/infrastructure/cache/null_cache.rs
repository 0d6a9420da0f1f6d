//! No-op cache implementation for disabled caching.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A cache implementation that stores nothing.
///
/// Lookups always miss. Counter writes report [`CacheError::Disabled`] so the
/// visit worker records visits directly in the durable store instead.
///
/// # Use Cases
///
/// - Development environments without Redis
/// - Fallback when Redis connection fails at startup
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_url(&self, _short_code: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_url(&self, _short_code: &str, _long_url: &str, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn incr_visits(&self, _short_code: &str) -> CacheResult<()> {
        Err(CacheError::Disabled)
    }

    async fn read_visits(&self, _short_code: &str) -> CacheResult<Option<i64>> {
        Ok(None)
    }

    async fn take_visits(&self, _short_code: &str) -> CacheResult<i64> {
        Ok(0)
    }

    async fn restore_visits(&self, _short_code: &str, _delta: i64) -> CacheResult<()> {
        Err(CacheError::Disabled)
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_cache_always_misses() {
        let cache = NullCache::new();
        cache
            .set_url("abc123", "https://example.com", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get_url("abc123").await.unwrap(), None);
        assert_eq!(cache.read_visits("abc123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_null_cache_rejects_counter_writes() {
        let cache = NullCache::new();
        assert!(matches!(
            cache.incr_visits("abc123").await,
            Err(CacheError::Disabled)
        ));
    }
}
