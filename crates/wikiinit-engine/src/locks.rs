//! Per-wiki initialization locks

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per wiki id
///
/// Initializations of the same wiki queue behind each other while different
/// wikis proceed independently. Entries are kept for the process lifetime;
/// the number of wikis is bounded by the registry.
#[derive(Debug, Default)]
pub struct WikiLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl WikiLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `wiki_id`
    pub async fn acquire(&self, wiki_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(wiki_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Whether an initialization of `wiki_id` currently holds the lock
    pub fn is_locked(&self, wiki_id: &str) -> bool {
        self.locks
            .get(wiki_id)
            .map(|lock| lock.try_lock().is_err())
            .unwrap_or(false)
    }
}
