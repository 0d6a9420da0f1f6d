//! Short URL creation service.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{StoreError, UrlRepository};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{DEFAULT_CODE_LENGTH, generate_code, is_reserved};
use crate::utils::url_validator::validate_long_url;

/// Settings for the creation path.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub code_length: usize,
    pub max_attempts: usize,
    /// Applied when the request carries no `expires_at`.
    pub default_expiry: TimeDelta,
    pub cache_ttl: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            max_attempts: 5,
            default_expiry: TimeDelta::days(7),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Service for creating short URLs.
///
/// Generates a random code, lets the store's uniqueness constraint arbitrate
/// collisions, and warms the cache with the new mapping.
pub struct LinkService<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn CacheService>,
    settings: LinkSettings,
}

impl<R: UrlRepository + ?Sized> LinkService<R> {
    /// Creates a new link service.
    pub fn new(repository: Arc<R>, cache: Arc<dyn CacheService>, settings: LinkSettings) -> Self {
        Self {
            repository,
            cache,
            settings,
        }
    }

    /// Creates a short URL for `long_url`.
    ///
    /// `expires_at` defaults to now plus the configured default expiry. A
    /// timestamp in the past is accepted; the record then resolves as expired.
    ///
    /// # Collisions
    ///
    /// On [`StoreError::DuplicateCode`] a fresh code is generated and the
    /// insert retried, up to `max_attempts` inserts in total.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is invalid.
    /// Returns [`AppError::Internal`] if the entropy source fails, the store
    /// is unavailable, every attempt collided, or the default expiry does
    /// not fit in a timestamp.
    pub async fn create_short_url(
        &self,
        long_url: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<UrlRecord, AppError> {
        validate_long_url(&long_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let expires_at = match expires_at {
            Some(at) => at,
            None => Utc::now()
                .checked_add_signed(self.settings.default_expiry)
                .ok_or_else(|| {
                    AppError::internal(
                        "Default expiry out of range",
                        json!({ "default_expiry_seconds": self.settings.default_expiry.num_seconds() }),
                    )
                })?,
        };
        let record = self.insert_with_fresh_code(long_url, expires_at).await?;

        if record.is_expired() {
            debug!(code = %record.short_code, "Created already-expired record, not caching");
        } else if let Err(e) = self
            .cache
            .set_url(&record.short_code, &record.long_url, self.settings.cache_ttl)
            .await
        {
            warn!(code = %record.short_code, error = %e, "Failed to warm cache");
        }

        Ok(record)
    }

    async fn insert_with_fresh_code(
        &self,
        long_url: String,
        expires_at: DateTime<Utc>,
    ) -> Result<UrlRecord, AppError> {
        let mut attempts = 0;

        while attempts < self.settings.max_attempts {
            let code = generate_code(self.settings.code_length).map_err(|e| {
                AppError::internal(
                    "Failed to generate short code",
                    json!({ "reason": e.to_string() }),
                )
            })?;

            if is_reserved(&code) {
                continue;
            }
            attempts += 1;

            let new_record = NewUrlRecord {
                short_code: code,
                long_url: long_url.clone(),
                expires_at: Some(expires_at),
            };

            match self.repository.create(new_record).await {
                Ok(record) => return Ok(record),
                Err(StoreError::DuplicateCode) => {
                    warn!(attempt = attempts, "Short code collision, regenerating");
                    metrics::counter!("tinylink_code_collisions_total").increment(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique short code",
            json!({ "reason": "Too many collisions", "attempts": attempts }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockUrlRepository;
    use crate::infrastructure::cache::{MemoryCache, MockCacheService};
    use crate::infrastructure::cache::CacheError;

    fn echo_record(new_record: NewUrlRecord) -> UrlRecord {
        UrlRecord::new(
            10,
            new_record.long_url,
            new_record.short_code,
            0,
            Utc::now(),
            new_record.expires_at,
        )
    }

    #[tokio::test]
    async fn test_create_short_url_success() {
        let mut repo = MockUrlRepository::new();
        repo.expect_create()
            .withf(|r| r.short_code.len() == 6 && r.long_url == "https://example.com")
            .times(1)
            .returning(|r| Ok(echo_record(r)));

        let cache = Arc::new(MemoryCache::new());
        let service = LinkService::new(Arc::new(repo), cache.clone(), LinkSettings::default());

        let record = service
            .create_short_url("https://example.com".to_string(), None)
            .await
            .unwrap();

        assert_eq!(record.long_url, "https://example.com");
        assert_eq!(record.visits, 0);
        assert_eq!(
            cache.get_url(&record.short_code).await.unwrap(),
            Some("https://example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_short_url_defaults_expiry_to_seven_days() {
        let mut repo = MockUrlRepository::new();
        repo.expect_create().returning(|r| Ok(echo_record(r)));

        let service = LinkService::new(
            Arc::new(repo),
            Arc::new(MemoryCache::new()),
            LinkSettings::default(),
        );

        let record = service
            .create_short_url("https://example.com".to_string(), None)
            .await
            .unwrap();

        let expires_at = record.expires_at.unwrap();
        let expected = Utc::now() + TimeDelta::days(7);
        assert!((expected - expires_at).num_seconds().abs() < 5);
    }

    #[tokio::test]
    async fn test_create_short_url_invalid_url() {
        let mut repo = MockUrlRepository::new();
        repo.expect_create().times(0);

        let service = LinkService::new(
            Arc::new(repo),
            Arc::new(MemoryCache::new()),
            LinkSettings::default(),
        );

        let result = service.create_short_url("not-a-url".to_string(), None).await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_short_url_retries_on_collision() {
        let mut repo = MockUrlRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_create()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(StoreError::DuplicateCode));
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|r| Ok(echo_record(r)));

        let service = LinkService::new(
            Arc::new(repo),
            Arc::new(MemoryCache::new()),
            LinkSettings::default(),
        );

        let result = service
            .create_short_url("https://example.com".to_string(), None)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_short_url_gives_up_after_max_attempts() {
        let mut repo = MockUrlRepository::new();
        repo.expect_create()
            .times(3)
            .returning(|_| Err(StoreError::DuplicateCode));

        let settings = LinkSettings {
            max_attempts: 3,
            ..LinkSettings::default()
        };
        let service = LinkService::new(Arc::new(repo), Arc::new(MemoryCache::new()), settings);

        let result = service
            .create_short_url("https://example.com".to_string(), None)
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_create_short_url_store_unavailable_is_not_retried() {
        let mut repo = MockUrlRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("connection refused".to_string())));

        let service = LinkService::new(
            Arc::new(repo),
            Arc::new(MemoryCache::new()),
            LinkSettings::default(),
        );

        let result = service
            .create_short_url("https://example.com".to_string(), None)
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_create_short_url_survives_cache_failure() {
        let mut repo = MockUrlRepository::new();
        repo.expect_create().returning(|r| Ok(echo_record(r)));

        let mut cache = MockCacheService::new();
        cache
            .expect_set_url()
            .times(1)
            .returning(|_, _, _| Err(CacheError::Timeout));

        let service = LinkService::new(Arc::new(repo), Arc::new(cache), LinkSettings::default());

        let result = service
            .create_short_url("https://example.com".to_string(), None)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_expired_record_is_not_cached() {
        let mut repo = MockUrlRepository::new();
        repo.expect_create().returning(|r| Ok(echo_record(r)));

        let mut cache = MockCacheService::new();
        cache.expect_set_url().times(0);

        let service = LinkService::new(Arc::new(repo), Arc::new(cache), LinkSettings::default());

        let record = service
            .create_short_url(
                "https://example.com".to_string(),
                Some(Utc::now() - TimeDelta::hours(1)),
            )
            .await
            .unwrap();

        assert!(record.is_expired());
    }

    #[tokio::test]
    async fn test_create_short_url_rejects_unrepresentable_default_expiry() {
        let mut repo = MockUrlRepository::new();
        repo.expect_create().times(0);

        let settings = LinkSettings {
            default_expiry: TimeDelta::MAX,
            ..LinkSettings::default()
        };
        let service = LinkService::new(Arc::new(repo), Arc::new(MemoryCache::new()), settings);

        let result = service
            .create_short_url("https://example.com".to_string(), None)
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Internal { .. }));
    }
}
