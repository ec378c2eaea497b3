use crate::domain::order::OrderId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-order critical sections.
///
/// Holding the guard for an order id excludes every other holder for that id; distinct ids
/// never contend. Entries are dropped once nobody holds or waits on them.
#[derive(Default)]
pub struct OrderLocks {
    locks: Arc<Mutex<HashMap<OrderId, Arc<AsyncMutex<()>>>>>,
}

pub struct OrderLockGuard {
    id: OrderId,
    locks: Arc<Mutex<HashMap<OrderId, Arc<AsyncMutex<()>>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: OrderId) -> OrderLockGuard {
        let lock = {
            let mut locks = self.locks.lock();
            // A waiter cancelled after the holder left drops its clone without cleaning up.
            // Counts only grow under this lock, so a lone map reference is safe to drop.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(id).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        OrderLockGuard {
            id,
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Number of order ids currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for OrderLockGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        // Release the async lock first so a waiter's clone is the only other reference.
        self.guard.take();
        if let Some(entry) = locks.get(&self.id)
            && Arc::strong_count(entry) == 1
        {
            locks.remove(&self.id);
        }
    }
}
