// ABOUTME: Slack realtime transport built on slack-morphism Socket Mode
// ABOUTME: Produces SlackEvent streams, runs the latency heartbeat, lists the directory, posts replies

pub mod channel;

use anyhow::{Context, Result};
use async_trait::async_trait;
use slack_morphism::errors::SlackClientError;
use slack_morphism::prelude::*;
use slagobot_core::config::SlackConfig;
use slagobot_core::{
    ChannelRecord, EventStream, OutboundSender, RealtimeTransport, SendError, SlackEvent,
    UserRecord,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

/// Page size for conversations.list / users.list
const DIRECTORY_PAGE_SIZE: u16 = 200;

/// Slack error codes that mean the token is no longer usable
const AUTH_ERROR_CODES: &[&str] = &[
    "invalid_auth",
    "not_authed",
    "account_inactive",
    "token_revoked",
    "token_expired",
];

// =============================================================================
// Shared state passed to Socket Mode callbacks via SlackClientEventsUserState
// =============================================================================

/// State shared with Socket Mode callback functions via user state storage.
/// Callbacks are fn pointers (not closures), so they cannot capture variables.
#[derive(Clone)]
struct SlackBridgeState {
    tx: Arc<mpsc::Sender<SlackEvent>>,
    bot_user_id: String,
}

/// Check whether a Slack API error code means the credentials were rejected
pub fn is_auth_error_code(code: &str) -> bool {
    AUTH_ERROR_CODES.contains(&code)
}

fn is_auth_error(err: &SlackClientError) -> bool {
    matches!(err, SlackClientError::ApiError(api) if is_auth_error_code(&api.code))
}

/// Translate the pieces of a Slack message event into a `SlackEvent::Message`.
///
/// Returns `None` for system messages without a user or channel and for the
/// bot's own messages.
pub fn message_event_from_parts(
    bot_user_id: &str,
    sender: Option<&str>,
    channel: Option<&str>,
    text: Option<&str>,
) -> Option<SlackEvent> {
    let sender_id = sender?;
    if sender_id == bot_user_id {
        return None;
    }
    let channel_id = channel?;
    Some(SlackEvent::message(
        sender_id,
        text.unwrap_or_default(),
        channel_id,
    ))
}

/// Build a directory user record from profile fields
pub fn user_record_from_parts(
    id: &str,
    name: Option<&str>,
    display_name: Option<&str>,
    real_name: Option<&str>,
) -> UserRecord {
    // Profile display names are often blank; the handle is the next best thing
    let display = display_name
        .filter(|d| !d.is_empty())
        .or(name)
        .unwrap_or_default();
    UserRecord::new(id, display, real_name.unwrap_or_default())
}

// =============================================================================
// Socket Mode callback functions (must be fn pointers, not closures)
// =============================================================================

async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bridge = {
        let guard = states.read().await;
        guard
            .get_user_state::<SlackBridgeState>()
            .cloned()
            .ok_or_else(|| "SlackBridgeState not found in user state")?
    };

    let translated = match event.event {
        SlackEventCallbackBody::Message(msg_event) => message_event_from_parts(
            &bridge.bot_user_id,
            msg_event.sender.user.as_ref().map(|u| u.0.as_str()),
            msg_event.origin.channel.as_ref().map(|c| c.0.as_str()),
            msg_event
                .content
                .as_ref()
                .and_then(|c| c.text.as_deref()),
        ),
        other => Some(SlackEvent::Unrecognized {
            kind: "push_event".to_string(),
            payload: format!("{:?}", other),
        }),
    };

    if let Some(event) = translated {
        if bridge.tx.send(event).await.is_err() {
            tracing::warn!(platform = "slack", "Event stream receiver dropped");
        }
    }
    Ok(())
}

fn socket_mode_error_handler(
    err: Box<dyn std::error::Error + Send + Sync>,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> HttpStatusCode {
    tracing::error!(platform = "slack", error = %err, "Socket Mode error");

    // Sync callback: forward without waiting, drop the report if contended
    if let Ok(guard) = states.try_read() {
        if let Some(bridge) = guard.get_user_state::<SlackBridgeState>() {
            let _ = bridge.tx.try_send(SlackEvent::Error {
                message: err.to_string(),
            });
        }
    }
    HttpStatusCode::OK
}

/// Background tasks spawned for an event stream, aborted on shutdown
#[derive(Default)]
pub struct BackgroundTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundTasks {
    pub fn track(&self, handle: JoinHandle<()>) {
        match self.handles.lock() {
            Ok(mut handles) => handles.push(handle),
            Err(_) => {
                tracing::warn!(platform = "slack", "Task list poisoned, aborting untracked task");
                handle.abort();
            }
        }
    }

    /// Abort every tracked task that is still running, returning how many were aborted
    pub fn abort_all(&self) -> usize {
        let handles = match self.handles.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        let mut aborted = 0;
        for handle in handles {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        aborted
    }

    pub fn len(&self) -> usize {
        self.handles.lock().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// SlackTransport
// =============================================================================

/// Slack connection using slack-morphism with Socket Mode
pub struct SlackTransport {
    client: Arc<SlackHyperClient>,
    /// Bot OAuth token (xoxb-...) for Web API calls
    bot_token: SlackApiToken,
    /// App-level token (xapp-...) for Socket Mode connections
    app_token: SlackApiToken,
    bot_user_id: String,
    team: String,
    /// Set when auth.test rejected the bot token at startup
    auth_rejected: bool,
    heartbeat: Duration,
    connection_count: Arc<AtomicU32>,
    /// Socket Mode listener and heartbeat tasks
    tasks: BackgroundTasks,
}

impl SlackTransport {
    /// Create a transport from config.
    ///
    /// Resolves the bot's user ID via `auth.test`. Rejected credentials do not
    /// fail here; they surface as an `InvalidAuth` event on the stream.
    pub async fn new(config: &SlackConfig) -> Result<Self> {
        let client = Arc::new(SlackClient::new(
            SlackClientHyperConnector::new().context("Failed to create Slack HTTP connector")?,
        ));

        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.bot_token.clone()));
        let app_token = SlackApiToken::new(SlackApiTokenValue(config.app_token.clone()));

        let session = client.open_session(&bot_token);
        let (bot_user_id, team, auth_rejected) = match session.auth_test().await {
            Ok(auth) => {
                tracing::info!(
                    bot_user = %auth.user_id,
                    team = %auth.team,
                    "Slack bot authenticated"
                );
                (auth.user_id.to_string(), auth.team, false)
            }
            Err(e) if is_auth_error(&e) => {
                tracing::error!(error = %e, "Slack rejected the bot token");
                (String::new(), String::new(), true)
            }
            Err(e) => {
                return Err(e).context("Failed to call Slack auth.test, check bot_token");
            }
        };

        Ok(Self {
            client,
            bot_token,
            app_token,
            bot_user_id,
            team,
            auth_rejected,
            heartbeat: Duration::from_secs(config.heartbeat_secs),
            connection_count: Arc::new(AtomicU32::new(0)),
            tasks: BackgroundTasks::default(),
        })
    }

    /// Periodically time an auth.test round trip and report it as latency
    fn spawn_heartbeat(&self, tx: mpsc::Sender<SlackEvent>) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let bot_token = self.bot_token.clone();
        let period = self.heartbeat;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let session = client.open_session(&bot_token);
                let started = Instant::now();
                let event = match session.auth_test().await {
                    Ok(_) => SlackEvent::LatencyReport {
                        value: started.elapsed(),
                    },
                    Err(e) if is_auth_error(&e) => SlackEvent::InvalidAuth,
                    Err(e) => SlackEvent::Error {
                        message: format!("heartbeat failed: {}", e),
                    },
                };
                let terminal = event.is_terminal();
                if tx.send(event).await.is_err() || terminal {
                    tracing::debug!(platform = "slack", "Heartbeat stopped");
                    break;
                }
            }
        })
    }
}

#[async_trait]
impl OutboundSender for SlackTransport {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), SendError> {
        channel::post_text(&self.client, &self.bot_token, channel_id, text).await
    }
}

#[async_trait]
impl RealtimeTransport for SlackTransport {
    async fn event_stream(&self) -> Result<EventStream> {
        let (tx, rx) = mpsc::channel(256);

        if self.auth_rejected {
            tx.send(SlackEvent::InvalidAuth)
                .await
                .context("Event stream closed before start")?;
            return Ok(Box::pin(ReceiverStream::new(rx)));
        }

        let client = Arc::clone(&self.client);
        let app_token = self.app_token.clone();
        let team = self.team.clone();
        let connection_count = Arc::clone(&self.connection_count);
        let listener_tx = tx.clone();

        let bridge_state = SlackBridgeState {
            tx: Arc::new(tx.clone()),
            bot_user_id: self.bot_user_id.clone(),
        };

        let listener = tokio::spawn(async move {
            let socket_mode_callbacks =
                SlackSocketModeListenerCallbacks::new().with_push_events(handle_push_event);

            let listener_environment = Arc::new(
                SlackClientEventsListenerEnvironment::new(client.clone())
                    .with_error_handler(socket_mode_error_handler)
                    .with_user_state(bridge_state),
            );

            let socket_mode_listener = SlackClientSocketModeListener::new(
                &SlackClientSocketModeConfig::new(),
                listener_environment,
                socket_mode_callbacks,
            );

            match socket_mode_listener.listen_for(&app_token).await {
                Ok(_) => {
                    let count = connection_count.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::info!(platform = "slack", connection_count = count, "Socket Mode connected");

                    let greeting = [
                        SlackEvent::Hello,
                        SlackEvent::Connected {
                            info: team,
                            connection_count: count,
                        },
                    ];
                    for event in greeting {
                        if listener_tx.send(event).await.is_err() {
                            return;
                        }
                    }

                    // serve() blocks until the listener is shut down
                    socket_mode_listener.serve().await;
                }
                Err(e) => {
                    tracing::error!(
                        platform = "slack",
                        error = %e,
                        "Failed to start Socket Mode listener"
                    );
                    let event = if is_auth_error(&e) {
                        SlackEvent::InvalidAuth
                    } else {
                        SlackEvent::Error {
                            message: e.to_string(),
                        }
                    };
                    let _ = listener_tx.send(event).await;
                }
            }
        });

        self.tasks.track(listener);
        self.tasks.track(self.spawn_heartbeat(tx));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn channel_snapshot(&self) -> Result<Vec<ChannelRecord>> {
        let session = self.client.open_session(&self.bot_token);
        let mut records = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;

        loop {
            let mut req = SlackApiConversationsListRequest::new()
                .with_limit(DIRECTORY_PAGE_SIZE)
                .with_exclude_archived(true);
            if let Some(c) = cursor.take() {
                req = req.with_cursor(c);
            }

            let resp = session
                .conversations_list(&req)
                .await
                .context("Failed to list Slack channels")?;

            records.extend(resp.channels.into_iter().filter_map(|ch| {
                ch.name
                    .map(|name| ChannelRecord::new(name, ch.id.to_string()))
            }));

            cursor = resp
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.0.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        Ok(records)
    }

    async fn user_snapshot(&self) -> Result<Vec<UserRecord>> {
        let session = self.client.open_session(&self.bot_token);
        let mut records = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;

        loop {
            let mut req = SlackApiUsersListRequest::new().with_limit(DIRECTORY_PAGE_SIZE);
            if let Some(c) = cursor.take() {
                req = req.with_cursor(c);
            }

            let resp = session
                .users_list(&req)
                .await
                .context("Failed to list Slack users")?;

            records.extend(resp.members.iter().map(|user| {
                let profile = user.profile.as_ref();
                user_record_from_parts(
                    &user.id.to_string(),
                    user.name.as_deref(),
                    profile.and_then(|p| p.display_name.as_deref()),
                    profile.and_then(|p| p.real_name.as_deref()),
                )
            }));

            cursor = resp
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.0.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        Ok(records)
    }

    async fn shutdown(&self) -> Result<()> {
        let aborted = self.tasks.abort_all();
        tracing::info!(platform = "slack", aborted, "Shutting down Slack transport");
        Ok(())
    }
}
