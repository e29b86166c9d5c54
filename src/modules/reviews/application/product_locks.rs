use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// In-process mutual exclusion per product id.
///
/// Serializes read-modify-write cycles on the same product inside one process;
/// different products never contend. Cross-process writers are still caught by
/// the store's version check.
#[derive(Debug, Default)]
pub struct ProductLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ProductLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, product_id: Uuid) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the DashMap shard guard is released before awaiting
        let lock = self
            .locks
            .entry(product_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        lock.lock_owned().await
    }

    /// Forget the product's lock once nobody holds or awaits it.
    /// Call after the guard from `acquire` has been dropped.
    pub fn release(&self, product_id: Uuid) {
        // The shard write lock orders this against `acquire` cloning the Arc out
        self.locks
            .remove_if(&product_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
