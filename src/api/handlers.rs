//! API Handlers
//!
//! HTTP request handlers for each order endpoint. This is where service
//! errors are translated into status codes (see `OrderError`'s
//! `IntoResponse`).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::Result;
use crate::models::{HealthResponse, ListOrdersQuery};
use crate::order::{Order, OrderService};

/// Application state shared across all handlers.
///
/// The service is cheap to clone; it only holds shared handles.
#[derive(Clone)]
pub struct AppState {
    pub service: OrderService,
}

impl AppState {
    /// Creates a new AppState around the given service.
    pub fn new(service: OrderService) -> Self {
        Self { service }
    }
}

/// Handler for GET /healthcheck
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Handler for GET /orders/:id
///
/// 404 when the order exists neither in the cache nor in the store.
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let order = state.service.get_order_by_id(&id).await?;
    Ok(Json(order))
}

/// Handler for GET /orders?limit=N
pub async fn list_orders_handler(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>> {
    let orders = state
        .service
        .get_orders_limit(query.effective_limit())
        .await?;
    Ok(Json(orders))
}

/// Handler for POST /orders
///
/// Publishes a generated order and returns it immediately. A 201 here does
/// not mean the order has been persisted yet.
pub async fn create_order_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state.service.create_order().await?;
    Ok((StatusCode::CREATED, Json(order)))
}
