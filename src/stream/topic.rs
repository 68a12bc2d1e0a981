//! In-Process Topic
//!
//! A bounded channel standing in for a broker topic. The producer side
//! implements `OrderPublisher`; the consumer side implements `MessageSource`,
//! tracks its committed offset and hands an uncommitted message out again.
//! Nothing survives a restart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::trace;

use crate::error::{OrderError, Result};
use crate::order::OrderPublisher;
use crate::stream::{MessageSource, StreamMessage};

/// Creates a topic holding at most `buffer` unconsumed messages.
pub fn channel(name: impl Into<String>, buffer: usize) -> (TopicProducer, TopicConsumer) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let name = Arc::<str>::from(name.into());
    let committed = Arc::new(AtomicU64::new(0));

    let producer = TopicProducer {
        name: name.clone(),
        tx,
        next_offset: Arc::new(Mutex::new(0)),
    };
    let consumer = TopicConsumer {
        name,
        rx,
        pending: None,
        committed,
    };
    (producer, consumer)
}

// == Producer ==
/// Writing half. Cloneable; the topic closes when every clone is dropped.
#[derive(Debug, Clone)]
pub struct TopicProducer {
    name: Arc<str>,
    tx: mpsc::Sender<StreamMessage>,
    /// Held across the send so offsets match delivery order
    next_offset: Arc<Mutex<u64>>,
}

impl TopicProducer {
    pub async fn send(&self, payload: Vec<u8>) -> Result<u64> {
        let mut next = self.next_offset.lock().await;
        let offset = *next;

        self.tx
            .send(StreamMessage { offset, payload })
            .await
            .map_err(|_| OrderError::Publish(format!("topic '{}' is closed", self.name)))?;

        *next += 1;
        trace!(topic = %self.name, offset, "message written");
        Ok(offset)
    }
}

#[async_trait]
impl OrderPublisher for TopicProducer {
    async fn write_messages(&self, payloads: Vec<Vec<u8>>) -> Result<()> {
        for payload in payloads {
            self.send(payload).await?;
        }
        Ok(())
    }
}

// == Consumer ==
/// Reading half.
#[derive(Debug)]
pub struct TopicConsumer {
    name: Arc<str>,
    rx: mpsc::Receiver<StreamMessage>,
    /// Fetched but not yet committed
    pending: Option<StreamMessage>,
    /// Offset of the next message to process after a restart
    committed: Arc<AtomicU64>,
}

impl TopicConsumer {
    /// Shared view of the committed offset.
    pub fn committed(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.committed)
    }
}

#[async_trait]
impl MessageSource for TopicConsumer {
    async fn fetch(&mut self) -> Result<Option<StreamMessage>> {
        if let Some(pending) = &self.pending {
            trace!(topic = %self.name, offset = pending.offset, "redelivering uncommitted message");
            return Ok(Some(pending.clone()));
        }

        let message = self.rx.recv().await;
        self.pending.clone_from(&message);
        Ok(message)
    }

    async fn commit(&mut self, message: &StreamMessage) -> Result<()> {
        self.committed.fetch_max(message.offset + 1, Ordering::AcqRel);
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.offset <= message.offset)
        {
            self.pending = None;
        }
        Ok(())
    }
}
