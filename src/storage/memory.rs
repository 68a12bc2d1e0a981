//! In-Memory Order Store
//!
//! Same contract as the PostgreSQL store, without durability. Used by the
//! test suite and by `STORE_BACKEND=memory` for running without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{OrderError, Result};
use crate::order::{Order, OrderRepository};

#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<()> {
        // First write wins, like ON CONFLICT DO NOTHING
        self.orders
            .write()
            .await
            .entry(order.order_uid.clone())
            .or_insert_with(|| order.clone());
        Ok(())
    }

    async fn get_by_id(&self, order_uid: &str) -> Result<Order> {
        self.orders
            .read()
            .await
            .get(order_uid)
            .cloned()
            .ok_or_else(|| OrderError::NotFound(order_uid.to_string()))
    }

    async fn get_limit(&self, limit: usize) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<&Order> = orders.values().collect();
        all.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        Ok(all.into_iter().take(limit).cloned().collect())
    }
}
