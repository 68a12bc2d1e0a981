//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint, with the in-memory
//! store and topic standing in for PostgreSQL and the broker.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use order_tracker::{
    api::create_router,
    order::{OrderRepository, OrderService},
    storage::InMemoryOrderRepository,
    stream::{self, MessageSource, TopicConsumer},
    AppState, Order, RecencyCache,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

// == Helper Functions ==

struct TestApp {
    router: Router,
    repo: Arc<InMemoryOrderRepository>,
    cache: Arc<RecencyCache>,
    service: OrderService,
    consumer: TopicConsumer,
}

fn create_test_app(capacity: usize) -> TestApp {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let cache = Arc::new(RecencyCache::new(capacity));
    let (producer, consumer) = stream::channel("orders", 64);
    let service = OrderService::new(repo.clone(), cache.clone(), Arc::new(producer));
    let router = create_router(AppState::new(service.clone()));
    TestApp {
        router,
        repo,
        cache,
        service,
        consumer,
    }
}

fn sample_order(id: &str) -> Order {
    let mut order = order_tracker::order::generator::random_order();
    order.order_uid = id.to_string();
    order
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn uids(json: &Value) -> Vec<&str> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|o| o["order_uid"].as_str().unwrap())
        .collect()
}

// == Healthcheck ==

#[tokio::test]
async fn test_healthcheck() {
    let app = create_test_app(10);

    let (status, json) = get(&app.router, "/healthcheck").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"status": "ok"}));
}

// == GET /orders/:id ==

#[tokio::test]
async fn test_get_order_from_cache() {
    let app = create_test_app(10);
    app.service.save_order(sample_order("order-z")).await.unwrap();

    let (status, json) = get(&app.router, "/orders/order-z").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order_uid"], "order-z");
    assert!(json["items"].as_array().is_some_and(|items| !items.is_empty()));
}

#[tokio::test]
async fn test_get_order_evicted_from_cache_served_by_store() {
    let app = create_test_app(1);
    app.service.save_order(sample_order("first")).await.unwrap();
    app.service.save_order(sample_order("second")).await.unwrap();
    assert!(app.cache.get("first").is_none());

    let (status, json) = get(&app.router, "/orders/first").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order_uid"], "first");
}

#[tokio::test]
async fn test_get_order_not_found() {
    let app = create_test_app(10);

    let (status, json) = get(&app.router, "/orders/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "order not found");
}

// == GET /orders ==

#[tokio::test]
async fn test_list_orders_most_recent_first() {
    let app = create_test_app(10);
    for id in ["A", "B", "C"] {
        app.service.save_order(sample_order(id)).await.unwrap();
    }

    let (status, json) = get(&app.router, "/orders?limit=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(uids(&json), vec!["C", "B"]);
}

#[tokio::test]
async fn test_list_orders_invalid_limit_uses_default() {
    let app = create_test_app(20);
    for i in 0..12 {
        app.service.save_order(sample_order(&format!("o{i}"))).await.unwrap();
    }

    for uri in ["/orders", "/orders?limit=-1", "/orders?limit=abc", "/orders?limit=0"] {
        let (status, json) = get(&app.router, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(json.as_array().unwrap().len(), 10, "{uri}");
    }
}

#[tokio::test]
async fn test_list_orders_empty() {
    let app = create_test_app(10);

    let (status, json) = get(&app.router, "/orders").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_list_orders_falls_back_to_store_when_cache_disabled() {
    let app = create_test_app(0);
    app.repo.save(&sample_order("stored")).await.unwrap();

    let (status, json) = get(&app.router, "/orders").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(uids(&json), vec!["stored"]);
}

// == POST /orders ==

#[tokio::test]
async fn test_create_order_publishes_without_persisting() {
    let mut app = create_test_app(10);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_to_json(response.into_body()).await;
    let uid = created["order_uid"].as_str().unwrap().to_string();
    assert!(!uid.is_empty());

    // Published, not yet stored
    let message = app.consumer.fetch().await.unwrap().unwrap();
    let published: Order = serde_json::from_slice(&message.payload).unwrap();
    assert_eq!(published.order_uid, uid);
    assert!(app.repo.get_by_id(&uid).await.unwrap_err().is_not_found());

    let (status, _) = get(&app.router, &format!("/orders/{uid}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == End to End ==

#[tokio::test]
async fn test_created_order_becomes_readable_after_consumption() {
    let app = create_test_app(10);
    let token = CancellationToken::new();
    let handle = order_tracker::spawn_consumer_task(
        app.consumer,
        app.service.clone(),
        Duration::from_millis(10),
        token.clone(),
    );

    let created = app.service.create_order().await.unwrap();
    let uri = format!("/orders/{}", created.order_uid);

    let mut status = StatusCode::NOT_FOUND;
    for _ in 0..100 {
        status = get(&app.router, &uri).await.0;
        if status == StatusCode::OK {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, StatusCode::OK);
    assert!(app.repo.get_by_id(&created.order_uid).await.is_ok());

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_served_over_tcp() {
    let app = create_test_app(10);
    app.service.save_order(sample_order("tcp-order")).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let token = CancellationToken::new();
    let server_token = token.clone();
    let router = app.router.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(server_token.cancelled_owned())
            .await
    });

    let client = reqwest::Client::new();
    let health: Value = client
        .get(format!("http://{addr}/healthcheck"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let order: Order = client
        .get(format!("http://{addr}/orders/tcp-order"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(order.order_uid, "tcp-order");

    token.cancel();
    server.await.unwrap().unwrap();
}
