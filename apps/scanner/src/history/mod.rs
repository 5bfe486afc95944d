//! Bounded, deduplicated, persisted scan history.
//!
//! The list holds at most one record per code, ordered newest-first, capped
//! at [`MAX_HISTORY_ITEMS`] with tail eviction. Every mutation runs under a
//! single async mutex held across both the in-memory change and the durable
//! write, so operations appear atomic to one another and a later `upsert`
//! always computes eviction against the list the previous one left behind.

pub mod storage;

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::history::storage::HistoryStorage;
use crate::models::history::HistoryRecord;
use crate::models::product::ProductSnapshot;

/// Maximum number of retained history entries. Insertion beyond the cap
/// evicts the oldest (tail) records.
pub const MAX_HISTORY_ITEMS: usize = 50;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to persist history: {0}")]
    Persist(#[source] anyhow::Error),
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<HistoryRecord>,
    hydrated: bool,
}

/// The history store. Load failures are recovered locally (empty list);
/// write failures are returned to the caller, never swallowed. After a
/// failed write the in-memory list may be ahead of durable state; the
/// caller must treat the operation as failed.
pub struct HistoryStore {
    storage: Arc<dyn HistoryStorage>,
    inner: Mutex<Inner>,
}

impl HistoryStore {
    pub fn new(storage: Arc<dyn HistoryStorage>) -> Self {
        Self {
            storage,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Hydrates the in-memory list from durable storage. Missing or corrupt
    /// data falls back to an empty list and never fails the caller.
    /// Calling it again after hydration is a no-op.
    pub async fn load(&self) {
        let mut inner = self.inner.lock().await;
        if inner.hydrated {
            return;
        }
        match self.storage.load().await {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<HistoryRecord>>(&payload) {
                Ok(records) => {
                    debug!(count = records.len(), "history hydrated");
                    inner.records = records;
                }
                Err(e) => warn!("discarding corrupt history payload: {e}"),
            },
            Ok(None) => debug!("no persisted history found"),
            Err(e) => warn!("failed to load history, starting empty: {e:#}"),
        }
        inner.hydrated = true;
    }

    pub async fn is_hydrated(&self) -> bool {
        self.inner.lock().await.hydrated
    }

    /// Snapshot of the current list, newest first.
    pub async fn records(&self) -> Vec<HistoryRecord> {
        self.inner.lock().await.records.clone()
    }

    /// Inserts or refreshes the record for `code` at the front of the list,
    /// trims the tail past the cap, and persists the result before
    /// returning. `product: None` records a completed lookup with no match.
    pub async fn upsert(
        &self,
        code: &str,
        product: Option<ProductSnapshot>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.records.retain(|r| r.code != code);
        inner.records.insert(
            0,
            HistoryRecord {
                code: code.to_string(),
                observed_at: Utc::now().timestamp_millis(),
                product,
            },
        );
        inner.records.truncate(MAX_HISTORY_ITEMS);
        self.persist(&inner.records).await
    }

    /// Drops the record for `code` if present and persists. Removing an
    /// absent code still rewrites the blob, which keeps it a plain filter.
    pub async fn remove(&self, code: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.records.retain(|r| r.code != code);
        self.persist(&inner.records).await
    }

    /// Empties the list and deletes the durable slot entirely; an absent
    /// slot is distinct from a persisted empty list.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.records.clear();
        self.storage.delete().await.map_err(StoreError::Persist)
    }

    async fn persist(&self, records: &[HistoryRecord]) -> Result<(), StoreError> {
        let payload = serde_json::to_string(records)?;
        self.storage.save(&payload).await.map_err(StoreError::Persist)
    }
}

#[cfg(test)]
mod tests {
    use super::storage::{FileHistoryStorage, MemoryHistoryStorage};
    use super::*;

    fn snapshot(code: &str) -> ProductSnapshot {
        ProductSnapshot {
            name: format!("Product {code}"),
            brand: None,
            code: code.to_string(),
            image_url: None,
        }
    }

    fn store() -> (Arc<MemoryHistoryStorage>, HistoryStore) {
        let storage = Arc::new(MemoryHistoryStorage::new());
        let store = HistoryStore::new(Arc::clone(&storage) as Arc<dyn HistoryStorage>);
        (storage, store)
    }

    #[tokio::test]
    async fn test_upsert_inserts_at_front() {
        let (_, store) = store();
        store.load().await;
        store.upsert("1", Some(snapshot("1"))).await.unwrap();
        store.upsert("2", Some(snapshot("2"))).await.unwrap();

        let records = store.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, "2");
        assert_eq!(records[1].code, "1");
    }

    #[tokio::test]
    async fn test_upsert_same_code_dedups_and_moves_to_front() {
        let (_, store) = store();
        store.load().await;
        store.upsert("1", Some(snapshot("1"))).await.unwrap();
        store.upsert("2", Some(snapshot("2"))).await.unwrap();

        let updated = ProductSnapshot {
            name: "Renamed".to_string(),
            ..snapshot("1")
        };
        store.upsert("1", Some(updated.clone())).await.unwrap();

        let records = store.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, "1");
        assert_eq!(records[0].product, Some(updated));
        assert_eq!(records[1].code, "2");
    }

    #[tokio::test]
    async fn test_length_never_exceeds_cap() {
        let (_, store) = store();
        store.load().await;
        for i in 0..120 {
            store.upsert(&format!("{i}"), None).await.unwrap();
            assert!(store.records().await.len() <= MAX_HISTORY_ITEMS);
        }
    }

    #[tokio::test]
    async fn test_eviction_drops_oldest() {
        let (_, store) = store();
        store.load().await;
        for i in 0..=50 {
            store.upsert(&format!("{i}"), Some(snapshot(&format!("{i}")))).await.unwrap();
        }

        let records = store.records().await;
        assert_eq!(records.len(), 50);
        assert!(!records.iter().any(|r| r.code == "0"));
        for (pos, record) in records.iter().enumerate() {
            assert_eq!(record.code, format!("{}", 50 - pos));
        }
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let storage = Arc::new(MemoryHistoryStorage::new());
        storage.set_blob(r#"[{"code":"7","observedAt":1000,"product":null}]"#);

        let store = HistoryStore::new(Arc::clone(&storage) as Arc<dyn HistoryStorage>);
        store.load().await;
        let first = store.records().await;
        store.load().await;
        assert_eq!(store.records().await, first);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].code, "7");
    }

    #[tokio::test]
    async fn test_load_recovers_from_corrupt_payload() {
        let storage = Arc::new(MemoryHistoryStorage::new());
        storage.set_blob("not json at all {");

        let store = HistoryStore::new(Arc::clone(&storage) as Arc<dyn HistoryStorage>);
        store.load().await;
        assert!(store.is_hydrated().await);
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_filters_record_and_tolerates_absent_code() {
        let (_, store) = store();
        store.load().await;
        store.upsert("1", None).await.unwrap();
        store.upsert("2", None).await.unwrap();

        store.remove("1").await.unwrap();
        assert_eq!(store.records().await.len(), 1);

        store.remove("does-not-exist").await.unwrap();
        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_deletes_durable_slot() {
        let (storage, store) = store();
        store.load().await;
        store.upsert("1", None).await.unwrap();
        assert!(storage.blob().is_some());

        store.clear().await.unwrap();
        assert!(store.records().await.is_empty());
        // The slot must be gone, not hold a "[]" placeholder.
        assert_eq!(storage.blob(), None);
    }

    #[tokio::test]
    async fn test_persist_failure_propagates() {
        let (storage, store) = store();
        store.load().await;
        storage.set_fail_writes(true);

        let err = store.upsert("1", None).await.unwrap_err();
        assert!(matches!(err, StoreError::Persist(_)));

        let err = store.remove("1").await.unwrap_err();
        assert!(matches!(err, StoreError::Persist(_)));

        let err = store.clear().await.unwrap_err();
        assert!(matches!(err, StoreError::Persist(_)));
    }

    #[tokio::test]
    async fn test_persisted_layout_round_trips_through_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let store = HistoryStore::new(Arc::new(FileHistoryStorage::new(&path)));
        store.load().await;
        store.upsert("111", Some(snapshot("111"))).await.unwrap();
        store.upsert("222", None).await.unwrap();

        // Simulate a process restart with a fresh store over the same file.
        let reopened = HistoryStore::new(Arc::new(FileHistoryStorage::new(&path)));
        reopened.load().await;
        let records = reopened.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, "222");
        assert_eq!(records[0].product, None);
        assert_eq!(records[1].code, "111");
        assert_eq!(records[1].product, Some(snapshot("111")));
    }

    #[tokio::test]
    async fn test_clear_then_restart_loads_empty_from_absent_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let store = HistoryStore::new(Arc::new(FileHistoryStorage::new(&path)));
        store.load().await;
        store.upsert("1", None).await.unwrap();
        store.clear().await.unwrap();
        assert!(!path.exists());

        let reopened = HistoryStore::new(Arc::new(FileHistoryStorage::new(&path)));
        reopened.load().await;
        assert!(reopened.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_lose_no_updates() {
        let (_, store) = store();
        store.load().await;
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.upsert(&format!("{i}"), None).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.records().await.len(), 20);
    }
}
