//! Error types for the order tracker
//!
//! Provides unified error handling using thiserror. The cache layer never
//! produces errors; everything here originates in the store, the publisher,
//! the stream or the HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Order Error Enum ==
/// Unified error type for the order tracker.
#[derive(Error, Debug)]
pub enum OrderError {
    /// No order with the given identifier exists anywhere
    #[error("order not found: {0}")]
    NotFound(String),

    /// Inbound payload could not be decoded or is structurally invalid
    #[error("malformed order: {0}")]
    Malformed(String),

    /// Database or broker could not be reached
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Query or transaction failure
    #[error("database error: {0}")]
    Database(String),

    /// Outbound publish failure
    #[error("publish error: {0}")]
    Publish(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl OrderError {
    /// True for lookup misses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrderError::NotFound(_))
    }
}

// == Conversions ==
impl From<tokio_postgres::Error> for OrderError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            OrderError::Unavailable(err.to_string())
        } else {
            OrderError::Database(err.to_string())
        }
    }
}

impl From<deadpool_postgres::PoolError> for OrderError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        OrderError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for OrderError {
    fn from(err: serde_json::Error) -> Self {
        OrderError::Malformed(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            OrderError::NotFound(_) => (StatusCode::NOT_FOUND, "order not found".to_string()),
            OrderError::Malformed(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            OrderError::Unavailable(_)
            | OrderError::Database(_)
            | OrderError::Publish(_)
            | OrderError::Internal(_) => {
                error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(ErrorResponse::new(message));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the order tracker.
pub type Result<T> = std::result::Result<T, OrderError>;
