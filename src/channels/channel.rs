//! The `Channel` trait: where events come from and where replies go.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;
use crate::router::{Event, Outbound};

/// Stream of decoded inbound events.
pub type EventStream = Pin<Box<dyn Stream<Item = Event> + Send>>;

/// A chat transport.
///
/// Channels own decoding (transport update → [`Event`]) and rendering
/// ([`Outbound`] → transport call). The router never sees either format.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Start receiving events.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Send one outbound item in response to `event`.
    async fn deliver(&self, event: &Event, outbound: Outbound) -> Result<(), ChannelError>;

    /// Check that the transport is reachable and the credentials work.
    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
