//! Short code resolution: cache-aside lookup with expiry enforcement.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::repositories::{StoreError, UrlRepository};
use crate::domain::visit_event::VisitSender;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::is_well_formed;

/// Where a resolved URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Cache,
    Store,
}

impl LookupSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupSource::Cache => "cache",
            LookupSource::Store => "store",
        }
    }
}

/// Outcome of resolving a short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found {
        long_url: String,
        source: LookupSource,
    },
    NotFound,
    Expired,
}

/// Resolves short codes to long URLs.
///
/// # Lookup Strategy
///
/// 1. Cache hit: count the visit and answer immediately. Expiry is **not**
///    re-checked, so a mapping cached before its record expired keeps
///    redirecting until the cache TTL runs out.
/// 2. Cache miss or cache error: read the durable record.
///    - unknown code: [`Resolution::NotFound`]
///    - expired record: [`Resolution::Expired`], cache left untouched
///    - otherwise: populate the cache with the fixed cache TTL, count the visit
///
/// Visit counting is handed to [`VisitSender`] and never delays the answer.
pub struct RedirectService<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn CacheService>,
    visits: VisitSender,
    cache_ttl: Duration,
}

impl<R: UrlRepository + ?Sized> RedirectService<R> {
    pub fn new(
        repository: Arc<R>,
        cache: Arc<dyn CacheService>,
        visits: VisitSender,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            visits,
            cache_ttl,
        }
    }

    /// Resolves `code` to its long URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the cache could not answer and the durable
    /// store failed as well. Cache failures alone never surface.
    pub async fn resolve(&self, code: &str) -> Result<Resolution, StoreError> {
        if !is_well_formed(code) {
            return Ok(Resolution::NotFound);
        }

        match self.cache.get_url(code).await {
            Ok(Some(long_url)) => {
                self.visits.record(code);
                return Ok(self.found(long_url, LookupSource::Cache));
            }
            Ok(None) => debug!(code, "Cache miss"),
            Err(e) => warn!(code, error = %e, "Cache lookup failed, falling back to store"),
        }

        let Some(record) = self.repository.find_by_code(code).await? else {
            return Ok(Resolution::NotFound);
        };

        if record.is_expired_at(Utc::now()) {
            debug!(code, "Record expired");
            return Ok(Resolution::Expired);
        }

        if let Err(e) = self
            .cache
            .set_url(code, &record.long_url, self.cache_ttl)
            .await
        {
            warn!(code, error = %e, "Failed to populate cache");
        }

        self.visits.record(code);
        Ok(self.found(record.long_url, LookupSource::Store))
    }

    fn found(&self, long_url: String, source: LookupSource) -> Resolution {
        metrics::counter!("tinylink_resolutions_total", "source" => source.as_str()).increment(1);
        Resolution::Found { long_url, source }
    }
}
