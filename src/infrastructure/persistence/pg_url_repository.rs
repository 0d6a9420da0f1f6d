//! PostgreSQL implementation of the URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{StoreError, UrlRepository};

/// Name of the unique constraint guarding `urls.short_code`.
const SHORT_CODE_CONSTRAINT: &str = "urls_short_code_key";

#[derive(sqlx::FromRow)]
struct UrlRow {
    id: i64,
    long_url: String,
    short_code: String,
    visits: i64,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl From<UrlRow> for UrlRecord {
    fn from(r: UrlRow) -> Self {
        UrlRecord::new(
            r.id,
            r.long_url,
            r.short_code,
            r.visits,
            r.created_at,
            r.expires_at,
        )
    }
}

/// Returns true if `e` is a unique violation on the short code constraint.
pub fn is_unique_violation_on_code(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    matches!(db_err.constraint(), Some(SHORT_CODE_CONSTRAINT))
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if is_unique_violation_on_code(&e) {
            return StoreError::DuplicateCode;
        }
        match e {
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// PostgreSQL repository for short URL records.
///
/// Every statement is bounded by `query_timeout` so a stalled database
/// surfaces as [`StoreError::Timeout`] rather than hanging the caller.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
    query_timeout: Duration,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, op).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn create(&self, new_record: NewUrlRecord) -> Result<UrlRecord, StoreError> {
        let row = self
            .bounded(
                sqlx::query_as::<_, UrlRow>(
                    r#"
                INSERT INTO urls (short_code, long_url, expires_at)
                VALUES ($1, $2, $3)
                RETURNING id, long_url, short_code, visits, created_at, expires_at
                "#,
                )
                .bind(&new_record.short_code)
                .bind(&new_record.long_url)
                .bind(new_record.expires_at)
                .fetch_one(self.pool.as_ref()),
            )
            .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StoreError> {
        let row = self
            .bounded(
                sqlx::query_as::<_, UrlRow>(
                    r#"
                SELECT id, long_url, short_code, visits, created_at, expires_at
                FROM urls
                WHERE short_code = $1
                "#,
                )
                .bind(code)
                .fetch_optional(self.pool.as_ref()),
            )
            .await?;

        Ok(row.map(UrlRecord::from))
    }

    async fn add_visits(&self, code: &str, delta: i64) -> Result<(), StoreError> {
        self.bounded(
            sqlx::query("UPDATE urls SET visits = visits + $2 WHERE short_code = $1")
                .bind(code)
                .bind(delta)
                .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(sqlx::query("SELECT 1").execute(self.pool.as_ref()))
            .await?;
        Ok(())
    }
}
