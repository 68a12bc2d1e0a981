//! Recency Tracker Module
//!
//! Tracks insertion order for eviction and recent-listing. Reads never
//! reorder; only inserts do.

use std::collections::VecDeque;

// == Recency Tracker ==
/// Keys in insertion-recency order:
/// - Front = most recently inserted
/// - Back = least recently inserted (next to evict)
#[derive(Debug, Default)]
pub struct RecencyTracker {
    order: VecDeque<String>,
}

impl RecencyTracker {
    // == Constructor ==
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
        }
    }

    // == Push Front ==
    /// Marks a key as the most recent insertion.
    ///
    /// The key must not already be tracked; use [`move_to_front`](Self::move_to_front)
    /// for a re-insert.
    pub fn push_front(&mut self, key: &str) {
        self.order.push_front(key.to_string());
    }

    // == Move To Front ==
    /// Re-insert of a tracked key: drops its old position, then pushes it.
    pub fn move_to_front(&mut self, key: &str) {
        self.remove(key);
        self.push_front(key);
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    // == Pop Oldest ==
    /// Removes and returns the least recently inserted key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    // == Iter ==
    /// Keys from most to least recent.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
