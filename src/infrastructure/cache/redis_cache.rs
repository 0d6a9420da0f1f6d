//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisResult, aio::ConnectionManager};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

const URL_KEY_PREFIX: &str = "url:";
const VISITS_KEY_PREFIX: &str = "visits:";

/// Redis cache implementation for URL lookups and live visit counters.
///
/// Uses `ConnectionManager` for reconnecting, multiplexed connection reuse.
/// Every command is bounded by `op_timeout`; a slow Redis reports
/// [`CacheError::Timeout`] instead of stalling the request.
pub struct RedisCache {
    client: ConnectionManager,
    op_timeout: Duration,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `op_timeout` - upper bound for each cache command (`CACHE_TIMEOUT_MS`)
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {}", e)))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            op_timeout,
        })
    }

    fn url_key(short_code: &str) -> String {
        format!("{}{}", URL_KEY_PREFIX, short_code)
    }

    fn visits_key(short_code: &str) -> String {
        format!("{}{}", VISITS_KEY_PREFIX, short_code)
    }

    async fn bounded<T, F>(&self, op: F) -> CacheResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Operation(e.to_string())),
            Err(_) => Err(CacheError::Timeout),
        }
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let key = Self::url_key(short_code);
        let mut conn = self.client.clone();

        let url = self.bounded(conn.get::<_, Option<String>>(&key)).await?;
        match &url {
            Some(url) => debug!("Cache HIT: {} -> {}", short_code, url),
            None => debug!("Cache MISS: {}", short_code),
        }
        Ok(url)
    }

    async fn set_url(&self, short_code: &str, long_url: &str, ttl: Duration) -> CacheResult<()> {
        let key = Self::url_key(short_code);
        let mut conn = self.client.clone();
        let ttl_seconds = ttl.as_secs().max(1);

        self.bounded(conn.set_ex::<_, _, ()>(&key, long_url, ttl_seconds))
            .await?;
        debug!(
            "Cache SET: {} -> {} (TTL: {}s)",
            short_code, long_url, ttl_seconds
        );
        Ok(())
    }

    async fn incr_visits(&self, short_code: &str) -> CacheResult<()> {
        let key = Self::visits_key(short_code);
        let mut conn = self.client.clone();

        self.bounded(conn.incr::<_, _, i64>(&key, 1)).await?;
        Ok(())
    }

    async fn read_visits(&self, short_code: &str) -> CacheResult<Option<i64>> {
        let key = Self::visits_key(short_code);
        let mut conn = self.client.clone();

        self.bounded(conn.get::<_, Option<i64>>(&key)).await
    }

    async fn take_visits(&self, short_code: &str) -> CacheResult<i64> {
        let key = Self::visits_key(short_code);
        let mut conn = self.client.clone();

        let taken = self
            .bounded(
                redis::cmd("GETDEL")
                    .arg(&key)
                    .query_async::<Option<i64>>(&mut conn),
            )
            .await?;
        Ok(taken.unwrap_or(0))
    }

    async fn restore_visits(&self, short_code: &str, delta: i64) -> CacheResult<()> {
        let key = Self::visits_key(short_code);
        let mut conn = self.client.clone();

        self.bounded(conn.incr::<_, _, i64>(&key, delta)).await?;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        self.bounded(conn.ping::<()>()).await.is_ok()
    }
}
