//! Stream Module
//!
//! Message transport between order producers and the ingest loop: a NATS
//! JetStream backend for production and an in-process topic for running
//! without a broker.

pub mod nats;
pub mod topic;

use async_trait::async_trait;

use crate::error::Result;

pub use nats::{NatsConsumer, NatsPublisher, NatsStream};
pub use topic::{channel, TopicConsumer, TopicProducer};

/// One record fetched from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    /// Position within the stream
    pub offset: u64,
    /// JSON-encoded order
    pub payload: Vec<u8>,
}

/// Source of inbound messages with explicit commits.
///
/// Delivery is at least once: a message that is fetched but not committed
/// before the next `fetch` is returned again by that fetch. `fetch` must be
/// cancel-safe; dropping the future loses no message.
#[async_trait]
pub trait MessageSource: Send {
    /// Next message, or `None` once the stream is closed.
    async fn fetch(&mut self) -> Result<Option<StreamMessage>>;

    /// Marks everything up to and including `message` as processed.
    async fn commit(&mut self, message: &StreamMessage) -> Result<()>;
}
