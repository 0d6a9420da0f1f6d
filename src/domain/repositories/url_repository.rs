//! Repository trait for the durable record store.

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use async_trait::async_trait;

/// Errors surfaced by the durable record store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The generated short code collides with an existing one.
    ///
    /// Retryable: callers regenerate the code and insert again.
    #[error("short code already exists")]
    DuplicateCode,

    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("record store operation timed out")]
    Timeout,
}

/// Repository interface for short URL records.
///
/// Uniqueness of `short_code` is enforced by the store itself; the
/// application never checks for existence before inserting.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryUrlRepository`] - Process-local map
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_url.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Inserts a new record and returns it with store-assigned `id` and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateCode`] if the short code is taken.
    /// Returns [`StoreError::Unavailable`] or [`StoreError::Timeout`] on connectivity failures.
    async fn create(&self, new_record: NewUrlRecord) -> Result<UrlRecord, StoreError>;

    /// Finds a record by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(UrlRecord))` if found (expired records included)
    /// - `Ok(None)` if not found
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StoreError>;

    /// Adds `delta` to the durable visit baseline of `code`.
    ///
    /// Unknown codes are ignored.
    async fn add_visits(&self, code: &str, delta: i64) -> Result<(), StoreError>;

    /// Checks store connectivity.
    async fn ping(&self) -> Result<(), StoreError>;
}
