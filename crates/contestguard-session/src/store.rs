//! Storage backends for session records.
//!
//! The registry never touches a `HashMap` directly; it goes through the
//! [`SessionStore`] trait. The in-memory [`MemoryStore`] is the only
//! backend today, but a persistent or shared store can be dropped in
//! without changing the registry or the HTTP layer.
//!
//! # Atomicity
//!
//! Reads and writes go through closures ([`read`](SessionStore::read),
//! [`update`](SessionStore::update)) instead of get/put pairs, so a backend
//! can run "check credential, then mutate" as one step. A caller never
//! observes a half-applied update.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::sync::Arc;

use contestguard_protocol::SessionId;
use tokio::sync::{Mutex, RwLock};

use crate::SessionRecord;

/// Keyed storage for session records.
///
/// # Trait bounds
///
/// `Send + Sync + 'static`, and every returned future is `Send`: the
/// store is shared by all request handlers, which Tokio may run on any
/// worker thread.
pub trait SessionStore: Send + Sync + 'static {
    /// Inserts a record under its own `session_id` unless that key is
    /// already taken.
    ///
    /// Returns the record back in `Err` on a key collision so the caller
    /// can retry with a new id.
    fn insert(
        &self,
        record: SessionRecord,
    ) -> impl Future<Output = Result<(), SessionRecord>> + Send;

    /// Runs `f` against the record, or returns `None` if there is none.
    fn read<R, F>(&self, id: &SessionId, f: F) -> impl Future<Output = Option<R>> + Send
    where
        F: FnOnce(&SessionRecord) -> R + Send,
        R: Send;

    /// Runs `f` against the record with exclusive access, or returns
    /// `None` if there is none.
    fn update<R, F>(&self, id: &SessionId, f: F) -> impl Future<Output = Option<R>> + Send
    where
        F: FnOnce(&mut SessionRecord) -> R + Send,
        R: Send;

    /// Removes and returns a record.
    fn remove(&self, id: &SessionId) -> impl Future<Output = Option<SessionRecord>> + Send;

    /// Removes and returns a record only if `pred` holds for it.
    ///
    /// The check and the removal are one step: no update can land
    /// between them.
    fn remove_if<F>(&self, id: &SessionId, pred: F) -> impl Future<Output = Option<SessionRecord>> + Send
    where
        F: FnOnce(&SessionRecord) -> bool + Send;

    /// Number of stored records.
    fn len(&self) -> impl Future<Output = usize> + Send;

    /// Ids of all stored records, in no particular order.
    fn ids(&self) -> impl Future<Output = Vec<SessionId>> + Send;
}

/// Process-memory store. Everything is lost on restart.
///
/// Two levels of locking:
/// - the `RwLock` around the map guards its structure (inserts, removes);
///   lookups take it only long enough to clone the record's `Arc`
/// - each record sits behind its own `Mutex`, so operations on one session
///   are serialised while different sessions proceed in parallel
///
/// Removal empties the slot under its lock. A request that looked the slot
/// up just before the removal finds it empty and reports the session as
/// missing instead of writing into a record nobody can see.
///
/// Lock order is always map, then record.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, Slot>>,
}

type Slot = Arc<Mutex<Option<SessionRecord>>>;

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: &SessionId) -> Option<Slot> {
        self.sessions.read().await.get(id).cloned()
    }
}

impl SessionStore for MemoryStore {
    async fn insert(&self, record: SessionRecord) -> Result<(), SessionRecord> {
        let mut sessions = self.sessions.write().await;
        match sessions.entry(record.session_id().clone()) {
            Entry::Occupied(_) => Err(record),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(Some(record))));
                Ok(())
            }
        }
    }

    async fn read<R, F>(&self, id: &SessionId, f: F) -> Option<R>
    where
        F: FnOnce(&SessionRecord) -> R + Send,
        R: Send,
    {
        let slot = self.slot(id).await?;
        let record = slot.lock().await;
        record.as_ref().map(f)
    }

    async fn update<R, F>(&self, id: &SessionId, f: F) -> Option<R>
    where
        F: FnOnce(&mut SessionRecord) -> R + Send,
        R: Send,
    {
        let slot = self.slot(id).await?;
        let mut record = slot.lock().await;
        record.as_mut().map(f)
    }

    async fn remove(&self, id: &SessionId) -> Option<SessionRecord> {
        let slot = self.sessions.write().await.remove(id)?;
        // Wait out any request already holding the record.
        slot.lock().await.take()
    }

    async fn remove_if<F>(&self, id: &SessionId, pred: F) -> Option<SessionRecord>
    where
        F: FnOnce(&SessionRecord) -> bool + Send,
    {
        let mut sessions = self.sessions.write().await;
        let slot = Arc::clone(sessions.get(id)?);
        let mut record = slot.lock().await;
        if !pred(record.as_ref()?) {
            return None;
        }
        sessions.remove(id);
        record.take()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::SessionSecrets;

    fn record(id: &str) -> SessionRecord {
        SessionRecord::new(
            SessionSecrets {
                session_id: id.into(),
                admin_token: "t".repeat(48),
                session_code: "5555".into(),
            },
            "Test".into(),
            Utc.timestamp_opt(0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_insert_then_read_returns_record() {
        let store = MemoryStore::new();
        store.insert(record("AAAA0001")).await.expect("insert");

        let name = store
            .read(&"AAAA0001".into(), |r| r.contest_name.clone())
            .await;

        assert_eq!(name.as_deref(), Some("Test"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_rejected_and_original_kept() {
        let store = MemoryStore::new();
        store.insert(record("AAAA0001")).await.expect("insert");

        let mut dup = record("AAAA0001");
        dup.contest_name = "Impostor".into();
        let rejected = store.insert(dup).await.expect_err("duplicate must fail");

        assert_eq!(rejected.contest_name, "Impostor");
        let name = store.read(&"AAAA0001".into(), |r| r.contest_name.clone()).await;
        assert_eq!(name.as_deref(), Some("Test"));
    }

    #[tokio::test]
    async fn test_read_and_update_unknown_id_return_none() {
        let store = MemoryStore::new();
        assert!(store.read(&"NOPE0000".into(), |_| ()).await.is_none());
        assert!(store.update(&"NOPE0000".into(), |_| ()).await.is_none());
        assert!(store.remove(&"NOPE0000".into()).await.is_none());
    }

    #[tokio::test]
    async fn test_update_is_visible_to_later_reads() {
        let store = MemoryStore::new();
        store.insert(record("AAAA0001")).await.expect("insert");

        store
            .update(&"AAAA0001".into(), |r| r.student_count += 5)
            .await
            .expect("exists");

        let count = store.read(&"AAAA0001".into(), |r| r.student_count).await;
        assert_eq!(count, Some(5));
    }

    #[tokio::test]
    async fn test_remove_deletes_record() {
        let store = MemoryStore::new();
        store.insert(record("AAAA0001")).await.expect("insert");
        store.insert(record("AAAA0002")).await.expect("insert");

        let removed = store.remove(&"AAAA0001".into()).await.expect("exists");

        assert_eq!(removed.session_id().as_str(), "AAAA0001");
        assert_eq!(store.ids().await, vec![SessionId::from("AAAA0002")]);
    }

    #[tokio::test]
    async fn test_remove_if_false_keeps_record() {
        let store = MemoryStore::new();
        store.insert(record("AAAA0001")).await.expect("insert");

        let removed = store.remove_if(&"AAAA0001".into(), |r| r.student_count > 0).await;

        assert!(removed.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_if_true_removes_record() {
        let store = MemoryStore::new();
        store.insert(record("AAAA0001")).await.expect("insert");

        let removed = store
            .remove_if(&"AAAA0001".into(), |r| r.contest_name == "Test")
            .await
            .expect("predicate holds");

        assert_eq!(removed.session_id().as_str(), "AAAA0001");
        assert_eq!(store.len().await, 0);
        assert!(store.remove_if(&"AAAA0001".into(), |_| true).await.is_none());
    }

    #[tokio::test]
    async fn test_update_through_stale_slot_after_remove_finds_nothing() {
        let store = MemoryStore::new();
        store.insert(record("AAAA0001")).await.expect("insert");
        let id = SessionId::from("AAAA0001");
        // A request that looked the slot up before the removal.
        let stale = store.slot(&id).await.expect("present");

        store.remove(&id).await.expect("exists");

        assert!(stale.lock().await.is_none());
        assert!(store.update(&id, |r| r.student_count += 1).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        store.insert(record("AAAA0001")).await.expect("insert");

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                for _ in 0..20 {
                    store
                        .update(&"AAAA0001".into(), |r| r.student_count += 1)
                        .await;
                }
            }));
        }
        for task in tasks {
            task.await.expect("task panicked");
        }

        let count = store.read(&"AAAA0001".into(), |r| r.student_count).await;
        assert_eq!(count, Some(1000));
    }
}
