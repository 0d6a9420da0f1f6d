//! Visit statistics: durable baseline merged with the live counter.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::domain::entities::UrlRecord;
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::is_well_formed;

/// Service for reading a record together with its effective visit count.
///
/// The live counter only holds visits not yet folded into the durable
/// baseline by the visit worker, so the effective count is their sum.
pub struct StatsService<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn CacheService>,
}

impl<R: UrlRepository + ?Sized> StatsService<R> {
    /// Creates a new statistics service.
    pub fn new(repository: Arc<R>, cache: Arc<dyn CacheService>) -> Self {
        Self { repository, cache }
    }

    /// Returns the record for `code` with `visits` set to the effective count.
    ///
    /// Existence is decided by the durable store alone. Expired records are
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record matches the code.
    /// Returns [`AppError::Internal`] on store failures.
    pub async fn stats(&self, code: &str) -> Result<UrlRecord, AppError> {
        let not_found = || AppError::not_found("Short URL not found", json!({ "code": code }));

        if !is_well_formed(code) {
            return Err(not_found());
        }

        let mut record = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or_else(not_found)?;

        match self.cache.read_visits(code).await {
            Ok(Some(live)) if live > 0 => record.visits += live,
            Ok(_) => {}
            Err(e) => warn!(code, error = %e, "Live counter unavailable, reporting durable count"),
        }

        Ok(record)
    }
}
