//! Request DTOs for the order API
//!
//! Defines the structure of incoming query parameters.

use serde::Deserialize;

/// Number of orders listed when no usable limit is given.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Query string for `GET /orders`
///
/// `limit` is kept as raw text so that a non-numeric value falls back to
/// the default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub limit: Option<String>,
}

impl ListOrdersQuery {
    /// Parsed limit; missing, invalid or non-positive values give the default.
    pub fn effective_limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|&n| n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_LIST_LIMIT)
    }
}
