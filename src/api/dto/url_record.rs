//! Wire representation of a stored short URL.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::UrlRecord;

/// Returned by both `POST /api/shorten` and `GET /api/stats/{code}`.
#[derive(Debug, Serialize)]
pub struct UrlRecordResponse {
    pub id: i64,
    pub long_url: String,
    pub short_code: String,
    pub visits: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<UrlRecord> for UrlRecordResponse {
    fn from(record: UrlRecord) -> Self {
        Self {
            id: record.id,
            long_url: record.long_url,
            short_code: record.short_code,
            visits: record.visits,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}
