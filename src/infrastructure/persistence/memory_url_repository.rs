//! In-memory implementation of the URL repository.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{StoreError, UrlRepository};

/// Process-local record store.
///
/// Records sit in a sharded [`DashMap`], so concurrent redirects and visit
/// flushes only contend when they touch the same shard. Enforces the same
/// short code uniqueness rule as the PostgreSQL schema, so the creation
/// retry loop behaves identically against it.
#[derive(Debug, Default)]
pub struct InMemoryUrlRepository {
    next_id: AtomicI64,
    records: DashMap<String, UrlRecord>,
}

impl InMemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully-formed record, bypassing id and timestamp assignment.
    ///
    /// Useful for seeding fixtures such as already-expired records.
    pub fn insert_record(&self, record: UrlRecord) {
        self.next_id.fetch_max(record.id, Ordering::SeqCst);
        self.records.insert(record.short_code.clone(), record);
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl UrlRepository for InMemoryUrlRepository {
    async fn create(&self, new_record: NewUrlRecord) -> Result<UrlRecord, StoreError> {
        // The entry guard holds the shard lock, so check-and-insert is atomic.
        match self.records.entry(new_record.short_code) {
            Entry::Occupied(_) => Err(StoreError::DuplicateCode),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                let record = UrlRecord::new(
                    id,
                    new_record.long_url,
                    slot.key().clone(),
                    0,
                    Utc::now(),
                    new_record.expires_at,
                );
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StoreError> {
        Ok(self.records.get(code).map(|record| record.clone()))
    }

    async fn add_visits(&self, code: &str, delta: i64) -> Result<(), StoreError> {
        if let Some(mut record) = self.records.get_mut(code) {
            record.visits += delta;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(code: &str) -> NewUrlRecord {
        NewUrlRecord {
            short_code: code.to_string(),
            long_url: "https://example.com".to_string(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let repo = InMemoryUrlRepository::new();
        let a = repo.create(new_record("aaaaaa")).await.unwrap();
        let b = repo.create(new_record("bbbbbb")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.visits, 0);
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_code() {
        let repo = InMemoryUrlRepository::new();
        repo.create(new_record("aaaaaa")).await.unwrap();

        let result = repo.create(new_record("aaaaaa")).await;
        assert_eq!(result.unwrap_err(), StoreError::DuplicateCode);
    }

    #[tokio::test]
    async fn test_concurrent_creates_of_one_code_admit_exactly_one() {
        let repo = std::sync::Arc::new(InMemoryUrlRepository::new());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create(new_record("aaaaaa")).await })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(StoreError::DuplicateCode) => duplicates += 1,
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 31);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_record_advances_ids() {
        let repo = InMemoryUrlRepository::new();
        repo.insert_record(UrlRecord::new(
            41,
            "https://example.com".to_string(),
            "seeded".to_string(),
            0,
            Utc::now(),
            None,
        ));

        let created = repo.create(new_record("aaaaaa")).await.unwrap();
        assert_eq!(created.id, 42);
    }

    #[tokio::test]
    async fn test_add_visits() {
        let repo = InMemoryUrlRepository::new();
        repo.create(new_record("aaaaaa")).await.unwrap();

        repo.add_visits("aaaaaa", 3).await.unwrap();
        repo.add_visits("unknown", 3).await.unwrap();

        let record = repo.find_by_code("aaaaaa").await.unwrap().unwrap();
        assert_eq!(record.visits, 3);
        assert!(repo.find_by_code("unknown").await.unwrap().is_none());
    }
}
