//! Order Ingest Task
//!
//! Background task that drains the order stream into the service, one
//! message at a time, committing only after a successful save.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::OrderError;
use crate::order::{Order, OrderService};
use crate::stream::{MessageSource, StreamMessage};

/// Spawns the sequential consumption loop.
///
/// The loop waits at most `poll_interval` for each message before checking
/// `shutdown` again, and exits on cancellation or when the stream closes.
/// A message that fails to decode or validate is logged and committed past.
/// A message whose save fails is left uncommitted; after `poll_interval` the
/// source delivers it again, and nothing behind it is committed first.
///
/// # Example
/// ```ignore
/// let (producer, consumer) = stream::channel("orders", 1024);
/// let handle = spawn_consumer_task(consumer, service, Duration::from_millis(100), token.clone());
/// // Later, during shutdown:
/// token.cancel();
/// handle.await?;
/// ```
pub fn spawn_consumer_task<S>(
    mut source: S,
    service: OrderService,
    poll_interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    S: MessageSource + 'static,
{
    tokio::spawn(async move {
        info!("Starting order consumer");

        loop {
            let fetched = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Order consumer received shutdown");
                    break;
                }
                fetched = tokio::time::timeout(poll_interval, source.fetch()) => fetched,
            };

            let message = match fetched {
                Err(_elapsed) => continue,
                Ok(Ok(Some(message))) => message,
                Ok(Ok(None)) => {
                    info!("Order stream closed");
                    break;
                }
                Ok(Err(err)) => {
                    error!(error = %err, "stream fetch failed");
                    if backoff(&shutdown, poll_interval).await {
                        break;
                    }
                    continue;
                }
            };

            if process(&service, &message).await {
                if let Err(err) = source.commit(&message).await {
                    warn!(offset = message.offset, error = %err, "commit failed");
                }
            } else if backoff(&shutdown, poll_interval).await {
                break;
            }
        }

        info!("Order consumer stopped");
    })
}

/// Sleeps for `delay`. Returns true if shutdown was requested meanwhile.
async fn backoff(shutdown: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => true,
        _ = tokio::time::sleep(delay) => false,
    }
}

/// Handles one message. Returns whether its offset should be committed.
async fn process(service: &OrderService, message: &StreamMessage) -> bool {
    let order: Order = match serde_json::from_slice(&message.payload) {
        Ok(order) => order,
        Err(err) => {
            warn!(
                offset = message.offset,
                error = %err,
                payload = %String::from_utf8_lossy(&message.payload),
                "dropping undecodable message"
            );
            return true;
        }
    };

    let order_uid = order.order_uid.clone();
    match service.save_order(order).await {
        Ok(()) => {
            debug!(offset = message.offset, %order_uid, "order ingested");
            true
        }
        Err(OrderError::Malformed(reason)) => {
            warn!(offset = message.offset, %order_uid, %reason, "dropping invalid order");
            true
        }
        Err(err) => {
            error!(offset = message.offset, %order_uid, error = %err, "save order failed");
            false
        }
    }
}
