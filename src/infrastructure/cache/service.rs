//! Cache service trait and error types.

use async_trait::async_trait;
use std::time::Duration;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache operation error: {0}")]
    Operation(String),

    #[error("Cache operation timed out")]
    Timeout,

    /// Caching is turned off; callers fall back to the durable store.
    #[error("Cache disabled")]
    Disabled,
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Ephemeral key-value cache for short code lookups and live visit counters.
///
/// Two key spaces are kept apart: URL mappings (with a TTL) and visit
/// counters (no TTL). Every error is recoverable by the caller; the cache is
/// an optimization, never a dependency.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process cache for tests and development
/// - [`crate::infrastructure::cache::NullCache`] - Caching disabled
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the long URL cached for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(url))` on cache hit
    /// - `Ok(None)` on cache miss
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot answer; this is distinct from a miss.
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>>;

    /// Stores a mapping, overwriting any existing entry.
    async fn set_url(&self, short_code: &str, long_url: &str, ttl: Duration) -> CacheResult<()>;

    /// Increments the live visit counter of a short code by one.
    async fn incr_visits(&self, short_code: &str) -> CacheResult<()>;

    /// Reads the live visit counter, `None` if no counter exists.
    async fn read_visits(&self, short_code: &str) -> CacheResult<Option<i64>>;

    /// Atomically reads and clears the live visit counter.
    ///
    /// Returns 0 when no counter exists.
    async fn take_visits(&self, short_code: &str) -> CacheResult<i64>;

    /// Adds `delta` back to the live visit counter.
    async fn restore_visits(&self, short_code: &str, delta: i64) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
