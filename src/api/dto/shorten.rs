//! DTOs for the shortening endpoint.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The URL to shorten. Scheme and host are checked again by the service.
    #[validate(url(message = "Invalid URL format"))]
    pub long_url: String,

    /// Optional expiry. Defaults to seven days from now; a past timestamp is
    /// accepted and the link resolves as gone.
    pub expires_at: Option<DateTime<Utc>>,
}
