//! # Per-Restaurant Locks
//!
//! Serializes waitlist mutations of one restaurant.
//!
//! ```text
//! restaurant A:  enqueue ──► [lock A] reorder ──► release
//!                notify  ──────────────► wait ──► [lock A] reorder
//! restaurant B:  enqueue ──► [lock B] reorder            (independent)
//! ```
//!
//! The lock is not re-entrant. Acquire it once per operation, at the top.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of restaurant id to its async mutex.
///
/// Entries are never evicted; the map holds one small mutex per restaurant
/// the engine has touched.
#[derive(Debug, Clone, Default)]
pub struct RestaurantLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl RestaurantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the lock of `restaurant_id`.
    pub async fn acquire(&self, restaurant_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(restaurant_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
