//! Shared catalog state: the published snapshot and the signals around it.

use crate::model::CatalogSnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;
use tokio::sync::{RwLock, watch};
use vscmirror_api::models::{IndexingProgress, IndexingStage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshTimes {
    pub last: Option<SystemTime>,
    pub next: Option<SystemTime>,
}

/// Holder of the current [`CatalogSnapshot`].
///
/// Readers clone the inner `Arc` and release the lock immediately; a rebuild swaps the
/// whole snapshot in one write. The lock never spans I/O.
pub struct CatalogIndex {
    current: RwLock<Arc<CatalogSnapshot>>,
    loaded: watch::Sender<bool>,
    refreshing: AtomicBool,
    indexing: AtomicBool,
    progress: Mutex<IndexingProgress>,
    refresh_times: Mutex<RefreshTimes>,
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogIndex {
    pub fn new() -> Self {
        let (loaded, _) = watch::channel(false);
        Self {
            current: RwLock::new(Arc::new(CatalogSnapshot::empty())),
            loaded,
            refreshing: AtomicBool::new(false),
            indexing: AtomicBool::new(false),
            progress: Mutex::new(IndexingProgress::idle()),
            refresh_times: Mutex::new(RefreshTimes::default()),
        }
    }

    /// Point-in-time view; stays valid after later swaps.
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().await.clone()
    }

    /// Replaces the published snapshot wholesale and returns the previous one.
    pub async fn publish(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let mut lock = self.current.write().await;
        std::mem::replace(&mut *lock, Arc::new(snapshot))
    }

    /// Set once; later calls are no-ops.
    pub fn mark_loaded(&self) {
        self.loaded.send_if_modified(|loaded| {
            let changed = !*loaded;
            *loaded = true;
            changed
        });
    }

    pub fn is_loaded(&self) -> bool {
        *self.loaded.borrow()
    }

    pub async fn wait_loaded(&self) {
        let mut rx = self.loaded.subscribe();
        // The sender lives as long as `self`, so this only returns once loaded.
        let _ = rx.wait_for(|loaded| *loaded).await;
    }

    /// Claims the single refresh slot, or `None` when a refresh is already running.
    pub fn try_begin_refresh(&self) -> Option<RefreshGuard<'_>> {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard { index: self })
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    pub fn is_indexing(&self) -> bool {
        self.indexing.load(Ordering::Acquire)
    }

    pub fn progress(&self) -> IndexingProgress {
        *lock(&self.progress)
    }

    pub fn set_progress(&self, stage: IndexingStage, current: usize, total: usize) {
        *lock(&self.progress) = IndexingProgress::new(stage, current, total);
    }

    /// Moves to `stage`, keeping the counters of the previous one.
    pub fn set_stage(&self, stage: IndexingStage) {
        lock(&self.progress).stage = stage;
    }

    pub fn advance(&self, current: usize) {
        lock(&self.progress).current = current;
    }

    pub fn refresh_times(&self) -> RefreshTimes {
        *lock(&self.refresh_times)
    }

    pub fn record_refresh(&self, completed: SystemTime, next: SystemTime) {
        *lock(&self.refresh_times) = RefreshTimes {
            last: Some(completed),
            next: Some(next),
        };
    }

    pub fn schedule_next(&self, next: SystemTime) {
        lock(&self.refresh_times).next = Some(next);
    }
}

/// Held for the duration of one refresh. Dropping it releases the slot and
/// resets the indexing flag and progress.
pub struct RefreshGuard<'a> {
    index: &'a CatalogIndex,
}

impl RefreshGuard<'_> {
    pub fn start_indexing(&self) {
        self.index.indexing.store(true, Ordering::Release);
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.index.set_progress(IndexingStage::Idle, 0, 0);
        self.index.indexing.store(false, Ordering::Release);
        self.index.refreshing.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vscmirror_api::models::ExtensionRecord;

    fn snapshot_of(identities: &[&str]) -> CatalogSnapshot {
        CatalogSnapshot::from_records(identities.iter().map(|id| {
            serde_json::from_value::<ExtensionRecord>(serde_json::json!({
                "identity": id,
                "versions": [{"version": "1.0.0"}]
            }))
            .unwrap()
        }))
    }

    #[tokio::test]
    async fn readers_keep_their_snapshot_across_publish() {
        let index = CatalogIndex::new();
        index.publish(snapshot_of(&["a.one"])).await;
        let before = index.snapshot().await;

        index.publish(snapshot_of(&["b.one", "b.two"])).await;
        assert_eq!(before.len(), 1);
        assert_eq!(index.snapshot().await.len(), 2);
    }

    #[test]
    fn refresh_slot_is_exclusive_and_resets_state() {
        let index = CatalogIndex::new();
        let guard = index.try_begin_refresh().expect("slot should be free");
        guard.start_indexing();
        index.set_progress(IndexingStage::Processing, 3, 10);
        assert!(index.try_begin_refresh().is_none());
        assert!(index.is_indexing());

        drop(guard);
        assert!(!index.is_indexing());
        assert!(!index.is_refreshing());
        assert_eq!(index.progress(), IndexingProgress::idle());
        assert!(index.try_begin_refresh().is_some());
    }

    #[test]
    fn stage_change_keeps_scanned_total() {
        let index = CatalogIndex::new();
        index.set_progress(IndexingStage::Processing, 0, 7);
        index.advance(7);
        index.set_stage(IndexingStage::Caching);
        assert_eq!(
            index.progress(),
            IndexingProgress::new(IndexingStage::Caching, 7, 7)
        );
    }

    #[tokio::test]
    async fn wait_loaded_returns_after_mark() {
        let index = Arc::new(CatalogIndex::new());
        assert!(!index.is_loaded());

        let waiter = {
            let index = Arc::clone(&index);
            tokio::spawn(async move { index.wait_loaded().await })
        };
        index.mark_loaded();
        index.mark_loaded();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
        assert!(index.is_loaded());
    }
}
