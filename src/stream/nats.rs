//! NATS JetStream Stream
//!
//! Broker-backed order stream. Orders published by any producer on the
//! configured subject are retained by a JetStream stream and read through a
//! durable pull consumer with explicit acknowledgement, so a restart resumes
//! after the last committed message.
//!
//! The consumer allows a single unacknowledged message. Messages are
//! therefore processed strictly in stream order, and a message that is
//! fetched but never committed is negatively acknowledged on the next fetch
//! and handed out again.

use std::time::Duration;

use async_nats::jetstream::{self, consumer::pull, AckKind};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info};

use crate::config::StreamConfig;
use crate::error::{OrderError, Result};
use crate::order::OrderPublisher;
use crate::stream::{MessageSource, StreamMessage};

/// How long JetStream keeps published orders.
const STREAM_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 3600);

/// Redelivery delay when the consumer stops without acking or nacking.
const CONSUMER_ACK_WAIT: Duration = Duration::from_secs(30);

// == Connection ==
/// JetStream context bound to the order subject.
#[derive(Clone)]
pub struct NatsStream {
    jetstream: jetstream::Context,
    config: StreamConfig,
}

impl NatsStream {
    /// Connects to the broker and makes sure the stream exists.
    pub async fn connect(config: &StreamConfig) -> Result<Self> {
        debug!(url = %config.nats_url, "connecting to NATS");
        let client = async_nats::connect(config.nats_url.as_str())
            .await
            .map_err(|e| OrderError::Unavailable(format!("failed to connect to NATS: {e}")))?;

        let jetstream = jetstream::new(client);
        jetstream
            .get_or_create_stream(stream_config(config))
            .await
            .map_err(|e| {
                OrderError::Unavailable(format!("failed to create stream '{}': {e}", config.stream_name))
            })?;

        info!(
            stream = %config.stream_name,
            subject = %config.topic,
            "JetStream stream ready"
        );
        Ok(Self {
            jetstream,
            config: config.clone(),
        })
    }

    /// Publisher writing to the order subject.
    pub fn publisher(&self) -> NatsPublisher {
        NatsPublisher {
            jetstream: self.jetstream.clone(),
            subject: self.config.topic.clone(),
        }
    }

    /// Opens the durable consumer, creating it on first use.
    pub async fn consumer(&self) -> Result<NatsConsumer> {
        let stream = self
            .jetstream
            .get_stream(self.config.stream_name.as_str())
            .await
            .map_err(|e| OrderError::Unavailable(format!("stream lookup failed: {e}")))?;

        let consumer = stream
            .get_or_create_consumer(
                self.config.consumer_name.as_str(),
                consumer_config(&self.config),
            )
            .await
            .map_err(|e| OrderError::Unavailable(format!("failed to create consumer: {e}")))?;

        let messages = consumer
            .messages()
            .await
            .map_err(|e| OrderError::Unavailable(format!("failed to open subscription: {e}")))?;

        info!(consumer = %self.config.consumer_name, "JetStream consumer ready");
        Ok(NatsConsumer {
            messages,
            pending: None,
        })
    }
}

fn stream_config(config: &StreamConfig) -> jetstream::stream::Config {
    jetstream::stream::Config {
        name: config.stream_name.clone(),
        subjects: vec![config.topic.clone()],
        retention: jetstream::stream::RetentionPolicy::Limits,
        max_age: STREAM_MAX_AGE,
        ..Default::default()
    }
}

fn consumer_config(config: &StreamConfig) -> pull::Config {
    pull::Config {
        durable_name: Some(config.consumer_name.clone()),
        filter_subject: config.topic.clone(),
        deliver_policy: jetstream::consumer::DeliverPolicy::All,
        ack_policy: jetstream::consumer::AckPolicy::Explicit,
        ack_wait: CONSUMER_ACK_WAIT,
        // One in flight keeps delivery in stream order across redeliveries
        max_ack_pending: 1,
        ..Default::default()
    }
}

// == Publisher ==
/// Writes orders to the subject and waits for the broker's ack.
#[derive(Clone)]
pub struct NatsPublisher {
    jetstream: jetstream::Context,
    subject: String,
}

#[async_trait]
impl OrderPublisher for NatsPublisher {
    async fn write_messages(&self, payloads: Vec<Vec<u8>>) -> Result<()> {
        for payload in payloads {
            let ack = self
                .jetstream
                .publish(self.subject.clone(), payload.into())
                .await
                .map_err(|e| OrderError::Publish(format!("publish to '{}' failed: {e}", self.subject)))?
                .await
                .map_err(|e| OrderError::Publish(format!("publish not acknowledged: {e}")))?;
            debug!(subject = %self.subject, sequence = ack.sequence, "message written");
        }
        Ok(())
    }
}

// == Consumer ==
/// Durable pull consumer. `commit` acks the fetched message.
pub struct NatsConsumer {
    messages: pull::Stream,
    /// Fetched but not yet committed, with its stream sequence
    pending: Option<(u64, jetstream::Message)>,
}

#[async_trait]
impl MessageSource for NatsConsumer {
    async fn fetch(&mut self) -> Result<Option<StreamMessage>> {
        // A lost nak still redelivers once the ack wait expires
        if let Some((offset, message)) = self.pending.take() {
            message
                .ack_with(AckKind::Nak(None))
                .await
                .map_err(|e| OrderError::Unavailable(format!("nak failed: {e}")))?;
            debug!(offset, "uncommitted message returned for redelivery");
        }

        let message = match self.messages.next().await {
            Some(result) => {
                result.map_err(|e| OrderError::Unavailable(format!("fetch failed: {e}")))?
            }
            None => return Ok(None),
        };

        let offset = message
            .info()
            .map_err(|e| OrderError::Unavailable(format!("message metadata missing: {e}")))?
            .stream_sequence;
        let payload = message.payload.to_vec();
        self.pending = Some((offset, message));

        Ok(Some(StreamMessage { offset, payload }))
    }

    async fn commit(&mut self, message: &StreamMessage) -> Result<()> {
        match &self.pending {
            Some((offset, _)) if *offset == message.offset => {}
            _ => return Ok(()),
        }

        if let Some((_, pending)) = self.pending.take() {
            pending
                .ack()
                .await
                .map_err(|e| OrderError::Unavailable(format!("ack failed: {e}")))?;
        }
        Ok(())
    }
}
