//! Capability Traits
//!
//! The service depends only on these abstractions; concrete stores,
//! caches and publishers are injected at assembly time.

use async_trait::async_trait;

use crate::error::Result;
use crate::order::Order;

/// In-memory fast path for reads. Never fails; lookups simply miss.
pub trait OrderCache: Send + Sync {
    /// Inserts or overwrites the entry for `order.order_uid`.
    fn set(&self, order: Order);

    /// Returns the stored order, if any. Does not affect recency.
    fn get(&self, order_uid: &str) -> Option<Order>;

    /// Up to `limit` orders, most recently inserted first.
    fn get_recent(&self, limit: usize) -> Vec<Order>;

    /// Seeds from a most-recent-first sequence, keeping its order.
    fn load(&self, orders: Vec<Order>);

    /// Maximum number of orders held. Zero means caching is disabled.
    fn capacity(&self) -> usize;
}

/// Durable order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Atomically stores the whole aggregate. Re-saving an existing
    /// identifier is a no-op.
    async fn save(&self, order: &Order) -> Result<()>;

    /// Full aggregate, or `OrderError::NotFound`.
    async fn get_by_id(&self, order_uid: &str) -> Result<Order>;

    /// Up to `limit` orders by creation time, newest first.
    async fn get_limit(&self, limit: usize) -> Result<Vec<Order>>;
}

/// Outbound topic writer.
#[async_trait]
pub trait OrderPublisher: Send + Sync {
    async fn write_messages(&self, payloads: Vec<Vec<u8>>) -> Result<()>;
}
