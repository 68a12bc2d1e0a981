//! Recency Cache Module
//!
//! Fixed-capacity order cache combining HashMap storage with insertion-order
//! tracking. Unlike an LRU, reads never change which entry is evicted next.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::trace;

use crate::cache::RecencyTracker;
use crate::order::{Order, OrderCache};

// == Cache State ==
/// Mapping and recency sequence, always updated together under one lock.
#[derive(Debug)]
struct CacheState {
    orders: HashMap<String, Order>,
    recency: RecencyTracker,
}

// == Recency Cache ==
/// Holds up to `capacity` most recently inserted orders.
///
/// Every operation takes the single exclusive lock for its whole duration
/// and never performs I/O while holding it.
#[derive(Debug)]
pub struct RecencyCache {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl RecencyCache {
    // == Constructor ==
    /// Creates an empty cache. A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                orders: HashMap::with_capacity(capacity),
                recency: RecencyTracker::with_capacity(capacity),
            }),
            capacity,
        }
    }

    // == Set ==
    /// Inserts or overwrites `order`, making it the most recent entry.
    ///
    /// Re-inserting a cached identifier replaces its snapshot and moves it
    /// to the front; it never evicts. A new identifier at capacity evicts
    /// the least recently inserted entry first.
    pub fn set(&self, order: Order) {
        if self.capacity == 0 {
            return;
        }

        let mut state = self.state.lock();
        let key = order.order_uid.clone();

        if state.orders.contains_key(&key) {
            state.recency.move_to_front(&key);
        } else {
            if state.recency.len() >= self.capacity {
                if let Some(evicted) = state.recency.pop_oldest() {
                    state.orders.remove(&evicted);
                    trace!(order_uid = %evicted, "evicted from cache");
                }
            }
            state.recency.push_front(&key);
        }

        state.orders.insert(key, order);
    }

    // == Get ==
    /// Returns a copy of the cached order, if present.
    pub fn get(&self, order_uid: &str) -> Option<Order> {
        self.state.lock().orders.get(order_uid).cloned()
    }

    // == Load ==
    /// Seeds the cache from a most-recent-first sequence.
    ///
    /// Orders are replayed through [`set`](Self::set) from the tail, so the
    /// resulting recency order matches the input and the first `capacity`
    /// orders are the ones retained.
    pub fn load(&self, orders: Vec<Order>) {
        for order in orders.into_iter().rev() {
            self.set(order);
        }
    }

    // == Get Recent ==
    /// Up to `limit` orders, most recent first.
    pub fn get_recent(&self, limit: usize) -> Vec<Order> {
        let state = self.state.lock();
        state
            .recency
            .iter()
            .take(limit)
            .filter_map(|id| state.orders.get(id).cloned())
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn recency_ids(&self) -> Vec<String> {
        self.state.lock().recency.iter().cloned().collect()
    }
}

impl OrderCache for RecencyCache {
    fn set(&self, order: Order) {
        RecencyCache::set(self, order)
    }

    fn get(&self, order_uid: &str) -> Option<Order> {
        RecencyCache::get(self, order_uid)
    }

    fn get_recent(&self, limit: usize) -> Vec<Order> {
        RecencyCache::get_recent(self, limit)
    }

    fn load(&self, orders: Vec<Order>) {
        RecencyCache::load(self, orders)
    }

    fn capacity(&self) -> usize {
        RecencyCache::capacity(self)
    }
}
