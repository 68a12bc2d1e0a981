//! API Module
//!
//! HTTP handlers and routing for the order REST API.
//!
//! # Endpoints
//! - `GET /healthcheck` - Health check endpoint
//! - `GET /orders/:id` - Retrieve an order by identifier
//! - `GET /orders?limit=N` - List the most recent orders
//! - `POST /orders` - Publish a generated order

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
