//! Order Tracker - order ingest and lookup service
//!
//! Consumes orders from a message stream, persists them in PostgreSQL and
//! serves lookups over HTTP, with a bounded recency cache on the read path.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod order;
pub mod storage;
pub mod stream;
pub mod tasks;

pub use api::AppState;
pub use cache::RecencyCache;
pub use config::Config;
pub use error::{OrderError, Result};
pub use order::{Order, OrderService};
pub use tasks::spawn_consumer_task;
