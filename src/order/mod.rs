//! Order Module
//!
//! Domain model, capability traits and the service that composes them.

pub mod generator;
mod model;
mod ports;
mod service;

pub use model::{Delivery, Order, Payment, Product};
pub use ports::{OrderCache, OrderPublisher, OrderRepository};
pub use service::OrderService;

#[cfg(test)]
pub(crate) use model::fixtures;
