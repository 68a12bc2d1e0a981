//! API Routes
//!
//! Configures the Axum router with all order endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_order_handler, get_order_handler, health_handler, list_orders_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /healthcheck` - Health check endpoint
/// - `GET /orders/:id` - Order by identifier
/// - `GET /orders?limit=N` - Most recent orders
/// - `POST /orders` - Generate and publish a random order
///
/// The collection routes are also served with a trailing slash.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthcheck", get(health_handler))
        .route("/orders", get(list_orders_handler).post(create_order_handler))
        .route("/orders/", get(list_orders_handler).post(create_order_handler))
        .route("/orders/:id", get(get_order_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
