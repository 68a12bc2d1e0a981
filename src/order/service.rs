//! Order Service
//!
//! Policy layer composing cache, store and outbound publisher: cache-first
//! reads, write-through ingest, and synthetic order creation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{OrderError, Result};
use crate::order::{generator, Order, OrderCache, OrderPublisher, OrderRepository};

/// Orchestrates reads and writes across the injected components.
#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    cache: Arc<dyn OrderCache>,
    publisher: Arc<dyn OrderPublisher>,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        cache: Arc<dyn OrderCache>,
        publisher: Arc<dyn OrderPublisher>,
    ) -> Self {
        Self {
            repo,
            cache,
            publisher,
        }
    }

    // == Save ==
    /// Makes the order visible in the cache, then persists it.
    ///
    /// A store failure is returned to the caller but the cache entry stays;
    /// callers that only commit after success get the message redelivered.
    pub async fn save_order(&self, order: Order) -> Result<()> {
        order.validate()?;
        self.cache.set(order.clone());

        if let Err(err) = self.repo.save(&order).await {
            warn!(order_uid = %order.order_uid, error = %err, "store write failed, cache entry kept");
            return Err(err);
        }

        debug!(order_uid = %order.order_uid, "order saved");
        Ok(())
    }

    // == Get By Id ==
    /// Cache hit returns immediately; a miss falls through to the store.
    pub async fn get_order_by_id(&self, order_uid: &str) -> Result<Order> {
        if let Some(order) = self.cache.get(order_uid) {
            debug!(order_uid, "cache hit");
            return Ok(order);
        }

        debug!(order_uid, "cache miss");
        self.repo.get_by_id(order_uid).await
    }

    // == Get Limit ==
    /// Recent orders from the cache, or from the store when the cache has none.
    ///
    /// A partial cache result is returned as-is and not topped up from the store.
    pub async fn get_orders_limit(&self, limit: usize) -> Result<Vec<Order>> {
        let recent = self.cache.get_recent(limit);
        if !recent.is_empty() {
            return Ok(recent);
        }

        self.repo.get_limit(limit).await
    }

    // == Create ==
    /// Generates a random order and publishes it.
    ///
    /// Nothing is cached or stored here; that happens when the message is
    /// consumed. The returned order is not yet durable.
    pub async fn create_order(&self) -> Result<Order> {
        let order = generator::random_order();
        let payload = serde_json::to_vec(&order).map_err(encode_error)?;

        self.publisher.write_messages(vec![payload]).await?;

        info!(order_uid = %order.order_uid, items = order.products.len(), "order published");
        Ok(order)
    }

    // == Warm Cache ==
    /// Seeds the cache with the store's most recent orders, as many as it holds.
    ///
    /// Returns how many orders were loaded.
    pub async fn warm_cache(&self) -> Result<usize> {
        let capacity = self.cache.capacity();
        if capacity == 0 {
            return Ok(0);
        }

        let orders = self.repo.get_limit(capacity).await?;
        let count = orders.len();
        self.cache.load(orders);
        Ok(count)
    }
}

/// Our own order failing to encode is a server fault, unlike inbound JSON.
fn encode_error(err: serde_json::Error) -> OrderError {
    OrderError::Internal(format!("failed to encode order: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RecencyCache;
    use crate::order::fixtures::sample_order;
    use crate::storage::InMemoryOrderRepository;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use parking_lot::Mutex;

    // == Test Doubles ==
    #[derive(Default)]
    struct RecordingPublisher {
        sent: Mutex<Vec<Vec<u8>>>,
        fail: bool,
    }

    #[async_trait]
    impl OrderPublisher for RecordingPublisher {
        async fn write_messages(&self, payloads: Vec<Vec<u8>>) -> Result<()> {
            if self.fail {
                return Err(OrderError::Publish("broker down".to_string()));
            }
            self.sent.lock().extend(payloads);
            Ok(())
        }
    }

    struct FailingRepository;

    #[async_trait]
    impl OrderRepository for FailingRepository {
        async fn save(&self, _order: &Order) -> Result<()> {
            Err(OrderError::Database("connection reset".to_string()))
        }

        async fn get_by_id(&self, _order_uid: &str) -> Result<Order> {
            Err(OrderError::Database("should not be called".to_string()))
        }

        async fn get_limit(&self, _limit: usize) -> Result<Vec<Order>> {
            Err(OrderError::Database("connection reset".to_string()))
        }
    }

    struct Fixture {
        service: OrderService,
        repo: Arc<InMemoryOrderRepository>,
        cache: Arc<RecencyCache>,
        publisher: Arc<RecordingPublisher>,
    }

    fn fixture(capacity: usize) -> Fixture {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let cache = Arc::new(RecencyCache::new(capacity));
        let publisher = Arc::new(RecordingPublisher::default());
        let service = OrderService::new(repo.clone(), cache.clone(), publisher.clone());
        Fixture {
            service,
            repo,
            cache,
            publisher,
        }
    }

    #[tokio::test]
    async fn test_save_order_writes_cache_and_store() {
        let f = fixture(10);

        f.service.save_order(sample_order("some-order")).await.unwrap();

        assert!(f.cache.get("some-order").is_some());
        assert!(f.repo.get_by_id("some-order").await.is_ok());
    }

    #[tokio::test]
    async fn test_save_order_store_failure_keeps_cache_entry() {
        let cache = Arc::new(RecencyCache::new(10));
        let service = OrderService::new(
            Arc::new(FailingRepository),
            cache.clone(),
            Arc::new(RecordingPublisher::default()),
        );

        let result = service.save_order(sample_order("o1")).await;

        assert!(matches!(result, Err(OrderError::Database(_))));
        assert!(cache.get("o1").is_some());
        assert_eq!(service.get_order_by_id("o1").await.unwrap().order_uid, "o1");
    }

    #[tokio::test]
    async fn test_save_order_rejects_empty_uid() {
        let f = fixture(10);

        let result = f.service.save_order(sample_order("")).await;

        assert!(matches!(result, Err(OrderError::Malformed(_))));
        assert!(f.cache.is_empty());
    }

    #[tokio::test]
    async fn test_get_order_by_id_prefers_cache() {
        let cache = Arc::new(RecencyCache::new(10));
        cache.set(sample_order("order-cache"));
        let service = OrderService::new(
            Arc::new(FailingRepository),
            cache,
            Arc::new(RecordingPublisher::default()),
        );

        let got = service.get_order_by_id("order-cache").await.unwrap();
        assert_eq!(got.order_uid, "order-cache");
    }

    #[tokio::test]
    async fn test_get_order_by_id_falls_back_to_store() {
        let f = fixture(10);
        f.repo.save(&sample_order("stored")).await.unwrap();

        let got = f.service.get_order_by_id("stored").await.unwrap();
        assert_eq!(got.order_uid, "stored");
    }

    #[tokio::test]
    async fn test_get_order_by_id_not_found() {
        let f = fixture(10);

        let err = f.service.get_order_by_id("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_orders_limit_falls_back_when_cache_empty() {
        let f = fixture(10);
        f.repo.save(&sample_order("order1")).await.unwrap();
        f.repo.save(&sample_order("order2")).await.unwrap();

        let res = f.service.get_orders_limit(2).await.unwrap();
        assert_eq!(res.len(), 2);
    }

    #[tokio::test]
    async fn test_get_orders_limit_does_not_merge_partial_cache() {
        let f = fixture(10);
        for id in ["s1", "s2", "s3"] {
            f.repo.save(&sample_order(id)).await.unwrap();
        }
        f.cache.set(sample_order("c1"));

        let res = f.service.get_orders_limit(3).await.unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].order_uid, "c1");
    }

    #[tokio::test]
    async fn test_create_order_publishes_once() {
        let f = fixture(10);

        let order = f.service.create_order().await.unwrap();

        assert!(!order.order_uid.is_empty());
        assert!(!order.products.is_empty());
        assert!(order.payment.amount > 0);

        let sent = f.publisher.sent.lock();
        assert_eq!(sent.len(), 1);
        let decoded: Order = serde_json::from_slice(&sent[0]).unwrap();
        assert_eq!(decoded, order);

        // Not written anywhere until consumed
        assert!(f.cache.get(&order.order_uid).is_none());
    }

    #[tokio::test]
    async fn test_create_order_publish_failure() {
        let publisher = Arc::new(RecordingPublisher {
            fail: true,
            ..Default::default()
        });
        let service = OrderService::new(
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(RecencyCache::new(10)),
            publisher,
        );

        assert!(matches!(
            service.create_order().await,
            Err(OrderError::Publish(_))
        ));
    }

    #[tokio::test]
    async fn test_warm_cache_loads_newest_first() {
        let f = fixture(2);
        let now = Utc::now();
        for (i, id) in ["old", "mid", "new"].iter().enumerate() {
            let mut order = sample_order(id);
            order.date_created = now + Duration::seconds(i as i64);
            f.repo.save(&order).await.unwrap();
        }

        let loaded = f.service.warm_cache().await.unwrap();

        assert_eq!(loaded, 2);
        let recent: Vec<String> = f.cache.get_recent(10).into_iter().map(|o| o.order_uid).collect();
        assert_eq!(recent, vec!["new", "mid"]);
    }

    #[test]
    fn test_encode_failure_is_internal() {
        use axum::{http::StatusCode, response::IntoResponse};
        use std::collections::HashMap;

        // Non-string map keys cannot be written as JSON
        let err = serde_json::to_vec(&HashMap::from([((1u8, 2u8), 0u8)])).unwrap_err();

        let mapped = encode_error(err);

        assert!(matches!(mapped, OrderError::Internal(_)));
        assert_eq!(
            mapped.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
