//! Request and Response models for the order API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ListOrdersQuery, DEFAULT_LIST_LIMIT};
pub use responses::{ErrorResponse, HealthResponse};
