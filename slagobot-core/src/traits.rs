// ABOUTME: Seams between the dispatch engine and the realtime transport
// ABOUTME: OutboundSender for replies, RealtimeTransport for events and directory snapshots

use crate::error::SendError;
use crate::events::{ChannelRecord, SlackEvent, UserRecord};
use anyhow::Result;
use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

/// Boxed stream of transport events, delivered in order
pub type EventStream = Pin<Box<dyn Stream<Item = SlackEvent> + Send>>;

/// Best-effort outbound delivery.
///
/// Callers log failures and move on; implementations must not retry.
#[async_trait]
pub trait OutboundSender: Send + Sync {
    /// Post `text` to the channel with id `channel_id`
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), SendError>;
}

/// A live realtime connection.
///
/// The transport owns connection management (reconnects, heartbeats) on its
/// own task and only hands events to the single dispatch consumer.
#[async_trait]
pub trait RealtimeTransport: OutboundSender {
    /// Start receiving events
    async fn event_stream(&self) -> Result<EventStream>;

    /// One-time listing of channels for the directory cache
    async fn channel_snapshot(&self) -> Result<Vec<ChannelRecord>>;

    /// One-time listing of users for the directory cache
    async fn user_snapshot(&self) -> Result<Vec<UserRecord>>;

    /// Gracefully shut down the connection
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
