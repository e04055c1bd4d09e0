// ABOUTME: Sequential event dispatcher: classifies each transport event and routes it to a handler
// ABOUTME: Owns directory, engagement, and latency state; the only writer of that state

use crate::{
    commands::{CommandRouter, OutboundMessage},
    directory::DirectoryCache,
    engagement::EngagementTracker,
    error::SendError,
    events::SlackEvent,
    latency::LatencyGauge,
    metrics,
    traits::OutboundSender,
};
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};

pub const CONNECTED_GREETING: &str = "Hi, I'm connected!";

/// Whether the loop keeps consuming after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Why the dispatch loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The transport stream ran out; normal shutdown
    StreamEnded,
    /// Credentials were rejected
    InvalidAuth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Events handled, including the one that stopped the loop
    pub events_processed: u64,
    pub reason: StopReason,
}

/// Render the typing nudge for a user
pub fn nudge_text(name: &str) -> String {
    format!("Wow! {} is typing! Say something wisdom!", name)
}

/// Single consumer of the realtime event stream.
///
/// Exactly one task drives a `Dispatcher`; every event, including its
/// outbound sends, is finished before the next one is pulled. Because of that
/// the state below is plain owned data with no locking. Handling events
/// concurrently would require moving this state behind an explicit
/// synchronization boundary first.
pub struct Dispatcher<S: OutboundSender> {
    sender: Arc<S>,
    directory: DirectoryCache,
    router: CommandRouter,
    engagement: EngagementTracker,
    latency: LatencyGauge,
}

impl<S: OutboundSender> Dispatcher<S> {
    pub fn new(sender: Arc<S>, directory: DirectoryCache, router: CommandRouter) -> Self {
        Self {
            sender,
            directory,
            router,
            engagement: EngagementTracker::new(),
            latency: LatencyGauge::new(),
        }
    }

    pub fn directory(&self) -> &DirectoryCache {
        &self.directory
    }

    pub fn engagement(&self) -> &EngagementTracker {
        &self.engagement
    }

    pub fn latency(&self) -> &LatencyGauge {
        &self.latency
    }

    fn default_channel_id(&self) -> &str {
        &self.router.auth().default_channel_id
    }

    /// Consume events until the stream ends or credentials are rejected.
    ///
    /// Nothing is pulled from `events` after an `InvalidAuth` event, so the
    /// caller can observe exactly what remained unconsumed.
    pub async fn run<E>(&mut self, events: &mut E) -> DispatchSummary
    where
        E: Stream<Item = SlackEvent> + Unpin,
    {
        tracing::info!(
            default_channel = %self.default_channel_id(),
            "Dispatcher awaiting first event"
        );

        let mut events_processed = 0u64;
        while let Some(event) = events.next().await {
            events_processed += 1;
            if self.handle(event).await == Flow::Stop {
                tracing::warn!(events_processed, "Dispatch loop stopped: invalid credentials");
                return DispatchSummary {
                    events_processed,
                    reason: StopReason::InvalidAuth,
                };
            }
        }

        tracing::info!(events_processed, "Event stream ended");
        DispatchSummary {
            events_processed,
            reason: StopReason::StreamEnded,
        }
    }

    /// Handle a single event to completion
    pub async fn handle(&mut self, event: SlackEvent) -> Flow {
        metrics::record_event(event.kind());

        match event {
            SlackEvent::Hello => {
                tracing::info!("Hello event");
                let report = self.router.host().report(self.latency.current());
                let destination = self.default_channel_id().to_string();
                self.send(&destination, &report).await;
            }
            SlackEvent::Connected {
                info,
                connection_count,
            } => {
                tracing::info!(info = %info, connection_count, "Connected");
                let destination = self.default_channel_id().to_string();
                self.send(&destination, CONNECTED_GREETING).await;
            }
            SlackEvent::Message {
                sender_id,
                text,
                channel_id,
            } => {
                tracing::info!(
                    sender = %sender_id,
                    channel = %channel_id,
                    channel_name = self.directory.channel_name_by_id(&channel_id).unwrap_or("?"),
                    text = %text,
                    "Message"
                );
                self.engagement.mark_engaged(&sender_id);

                let replies =
                    self.router
                        .route(&sender_id, &text, &channel_id, self.latency.current());
                for OutboundMessage { channel_id, text } in replies {
                    self.send(&channel_id, &text).await;
                }
            }
            SlackEvent::PresenceChange { user_id, presence } => {
                tracing::info!(user = %user_id, presence = %presence, "Presence change");
            }
            SlackEvent::LatencyReport { value } => {
                self.latency.record_duration(value);
                tracing::info!(latency = %self.latency.current(), "Current latency");
            }
            SlackEvent::DesktopNotification {
                title,
                subtitle,
                message,
                channel_id,
            } => {
                tracing::info!(
                    title = %title,
                    subtitle = %subtitle,
                    message = %message,
                    channel = %channel_id,
                    "Desktop notification"
                );
            }
            SlackEvent::UserTyping {
                sender_id,
                channel_id,
            } => self.handle_typing(&sender_id, &channel_id).await,
            SlackEvent::Error { message } => {
                tracing::error!(error = %message, "Transport error");
            }
            SlackEvent::InvalidAuth => {
                tracing::error!("Invalid credentials");
                return Flow::Stop;
            }
            SlackEvent::Unrecognized { kind, payload } => {
                tracing::debug!(kind = %kind, payload = %payload, "Unexpected event");
            }
        }

        Flow::Continue
    }

    async fn handle_typing(&mut self, sender_id: &str, channel_id: &str) {
        let name = match self.directory.user_display_name(sender_id) {
            Some(name) => name.to_string(),
            None => {
                tracing::warn!(user = %sender_id, "Typing user not in directory");
                sender_id.to_string()
            }
        };

        tracing::info!(
            user = %sender_id,
            name = %name,
            channel = %channel_id,
            "User typing"
        );

        if self.engagement.consume_if_armed(sender_id) {
            metrics::record_nudge();
            // Nudges answer in the channel where typing was seen
            self.send(channel_id, &nudge_text(&name)).await;
        }
    }

    /// Fire-and-forget delivery; failures are logged only
    async fn send(&self, channel_id: &str, text: &str) {
        if channel_id.is_empty() {
            metrics::record_send_failure("no_destination");
            tracing::warn!(error = %SendError::EmptyDestination, "Suppressing outbound message");
            return;
        }

        match self.sender.send(channel_id, text).await {
            Ok(()) => {
                metrics::record_message_sent();
                tracing::debug!(channel = %channel_id, "Message sent");
            }
            Err(e) => {
                metrics::record_send_failure("transport");
                tracing::error!(channel = %channel_id, error = %e, "Failed to send message");
            }
        }
    }
}
