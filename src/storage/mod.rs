//! Storage Module
//!
//! Durable order persistence behind the `OrderRepository` capability.

mod memory;
mod postgres;

pub use memory::InMemoryOrderRepository;
pub use postgres::PgOrderRepository;
