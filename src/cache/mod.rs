//! Cache Module
//!
//! Bounded, insertion-order-aware order cache used as the read fast path.

mod recency;
mod store;


// Re-export public types
pub use recency::RecencyTracker;
pub use store::RecencyCache;
