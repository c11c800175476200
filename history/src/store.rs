//! History store trait and bounded in-memory implementation.

use std::collections::VecDeque;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};
use xrate_common::time::constants;

use crate::error::HistoryResult;
use crate::record::{ConversionRecord, UserId};

/// Per-user conversion history, newest first.
///
/// Implementations enforce the length cap themselves; callers never truncate.
/// A user without history is not an error: `list` returns an empty list and
/// `clear` succeeds.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert at the front of the record owner's list and drop the oldest beyond the cap.
    async fn append(&self, record: ConversionRecord) -> HistoryResult<()>;

    /// Records for a user, newest first.
    async fn list(&self, user_id: &UserId) -> HistoryResult<Vec<ConversionRecord>>;

    /// Remove all records for a user.
    async fn clear(&self, user_id: &UserId) -> HistoryResult<()>;
}

/// In-memory history keyed by user.
///
/// Each append holds the user's map entry exclusively, so insert-then-truncate
/// is atomic with respect to other appends for the same user. Different users
/// land on independent entries.
pub struct InMemoryHistoryStore {
    entries: DashMap<UserId, VecDeque<ConversionRecord>>,
    limit: usize,
}

impl InMemoryHistoryStore {
    /// Create a store with the default cap.
    pub fn new() -> Self {
        Self::with_limit(constants::HISTORY_LIMIT)
    }

    /// Create a store keeping at most `limit` records per user (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: DashMap::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of users with history.
    pub fn user_count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    #[instrument(skip(self, record), fields(user = %record.user_id))]
    async fn append(&self, record: ConversionRecord) -> HistoryResult<()> {
        let mut list = self.entries.entry(record.user_id.clone()).or_default();
        list.push_front(record);
        list.truncate(self.limit);
        debug!(len = list.len(), "History appended");
        Ok(())
    }

    async fn list(&self, user_id: &UserId) -> HistoryResult<Vec<ConversionRecord>> {
        Ok(self
            .entries
            .get(user_id)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default())
    }

    #[instrument(skip(self), fields(user = %user_id))]
    async fn clear(&self, user_id: &UserId) -> HistoryResult<()> {
        let removed = self.entries.remove(user_id).map(|(_, list)| list.len());
        debug!(removed = removed.unwrap_or(0), "History cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use xrate_common::CurrencyCode;

    fn record(user: &str, amount: f64) -> ConversionRecord {
        ConversionRecord::new(
            UserId::new(user),
            CurrencyCode::usd(),
            CurrencyCode::eur(),
            amount,
            0.92,
            amount * 0.92,
        )
    }

    #[tokio::test]
    async fn test_append_caps_at_limit_newest_first() {
        let store = InMemoryHistoryStore::new();

        for i in 0..25 {
            store.append(record("alice", i as f64)).await.unwrap();
        }

        let history = store.list(&UserId::new("alice")).await.unwrap();
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].amount, 24.0);
        assert_eq!(history[19].amount, 5.0);
        assert!(history.iter().all(|r| r.amount >= 5.0));
    }

    #[tokio::test]
    async fn test_unknown_user_is_empty() {
        let store = InMemoryHistoryStore::new();

        assert!(store.list(&UserId::new("nobody")).await.unwrap().is_empty());
        tokio_test::assert_ok!(store.clear(&UserId::new("nobody")).await);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = InMemoryHistoryStore::new();
        store.append(record("alice", 1.0)).await.unwrap();
        store.append(record("bob", 2.0)).await.unwrap();
        store.append(record("", 3.0)).await.unwrap();

        store.clear(&UserId::new("alice")).await.unwrap();

        assert!(store.list(&UserId::new("alice")).await.unwrap().is_empty());
        assert_eq!(store.list(&UserId::new("bob")).await.unwrap().len(), 1);
        let anonymous = store.list(&UserId::anonymous()).await.unwrap();
        assert_eq!(anonymous[0].amount, 3.0);
        assert_eq!(store.user_count(), 2);
    }

    #[tokio::test]
    async fn test_custom_limit() {
        let store = InMemoryHistoryStore::with_limit(3);
        for i in 0..5 {
            store.append(record("carol", i as f64)).await.unwrap();
        }

        let amounts: Vec<f64> = store
            .list(&UserId::new("carol"))
            .await
            .unwrap()
            .iter()
            .map(|r| r.amount)
            .collect();
        assert_eq!(amounts, vec![4.0, 3.0, 2.0]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_respect_cap() {
        let store = Arc::new(InMemoryHistoryStore::new());

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let user = if i % 2 == 0 { "even" } else { "odd" };
                    store.append(record(user, i as f64)).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.list(&UserId::new("even")).await.unwrap().len(), 20);
        assert_eq!(store.list(&UserId::new("odd")).await.unwrap().len(), 20);
    }
}
