//! URL record entity: the durable short code → long URL mapping.

use chrono::{DateTime, Utc};

/// A persisted short URL mapping.
///
/// `visits` is the durable baseline only; live increments held in the cache
/// are merged in by [`crate::application::services::StatsService`].
#[derive(Debug, Clone, PartialEq)]
pub struct UrlRecord {
    pub id: i64,
    pub long_url: String,
    pub short_code: String,
    pub visits: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl UrlRecord {
    /// Creates a new UrlRecord instance.
    pub fn new(
        id: i64,
        long_url: String,
        short_code: String,
        visits: i64,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            long_url,
            short_code,
            visits,
            created_at,
            expires_at,
        }
    }

    /// Returns true if the record's expiry lies at or before `now`.
    ///
    /// A record without `expires_at` never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the record has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input data for inserting a new record.
#[derive(Debug, Clone)]
pub struct NewUrlRecord {
    pub short_code: String,
    pub long_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}
