//! Bot main loop: pulls events from a channel and routes them.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinSet;

use crate::channels::Channel;
use crate::error::ChannelError;
use crate::router::{Event, EventRouter};

/// Couples one channel to the router.
pub struct Bot {
    channel: Arc<dyn Channel>,
    router: Arc<EventRouter>,
}

impl Bot {
    pub fn new(channel: Arc<dyn Channel>, router: Arc<EventRouter>) -> Self {
        Self { channel, router }
    }

    /// Run until Ctrl+C or until the channel's stream ends.
    ///
    /// Each event is handled on its own task, so a slow backend call only
    /// delays the event that made it. Tasks still in flight are awaited
    /// before the channel is shut down.
    pub async fn run(self) -> Result<(), ChannelError> {
        let mut events = self.channel.start().await?;
        let mut in_flight = JoinSet::new();

        tracing::info!(channel = self.channel.name(), "Bot ready and listening");

        loop {
            let event = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                event = events.next() => {
                    match event {
                        Some(e) => e,
                        None => {
                            tracing::info!("Channel stream ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            let channel = Arc::clone(&self.channel);
            let router = Arc::clone(&self.router);
            in_flight.spawn(async move {
                dispatch(channel.as_ref(), &router, &event).await;
            });

            // Reap finished tasks so the set does not grow with uptime.
            while let Some(done) = in_flight.try_join_next() {
                if let Err(e) = done {
                    tracing::error!("Event task failed: {e}");
                }
            }
        }

        if !in_flight.is_empty() {
            tracing::info!(pending = in_flight.len(), "Waiting for in-flight events");
        }
        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                tracing::error!("Event task failed: {e}");
            }
        }

        self.channel.shutdown().await?;
        Ok(())
    }
}

/// Route one event and deliver the results in order.
///
/// Delivery failures are logged and the remaining items are still sent.
/// Returns how many items were delivered.
pub async fn dispatch(channel: &dyn Channel, router: &EventRouter, event: &Event) -> usize {
    let outbound = router.handle(event).await;
    let mut delivered = 0;

    for item in outbound {
        match channel.deliver(event, item).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::warn!(
                    channel = channel.name(),
                    event = %event.describe(),
                    "Delivery failed: {e}"
                );
            }
        }
    }

    delivered
}
