//! Background Tasks Module
//!
//! Contains the long-running tasks started alongside the HTTP server.
//!
//! # Tasks
//! - Order ingest: drains the order stream into the service

mod consumer;

pub use consumer::spawn_consumer_task;
