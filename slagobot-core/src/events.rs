// ABOUTME: Event and directory record types exchanged with the realtime transport.
// ABOUTME: SlackEvent is a closed sum type with one variant per event kind the engine understands.

use std::time::Duration;

/// One record pulled from the realtime event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlackEvent {
    /// Server greeting, first event on a fresh connection
    Hello,
    /// Connection established
    Connected {
        info: String,
        connection_count: u32,
    },
    /// A user posted text in a channel
    Message {
        sender_id: String,
        text: String,
        channel_id: String,
    },
    PresenceChange {
        user_id: String,
        presence: String,
    },
    /// Heartbeat round-trip measurement
    LatencyReport { value: Duration },
    DesktopNotification {
        title: String,
        subtitle: String,
        message: String,
        channel_id: String,
    },
    /// A user is composing a message
    UserTyping {
        sender_id: String,
        channel_id: String,
    },
    /// Transport-reported error; never fatal
    Error { message: String },
    /// Credentials rejected; the dispatch loop stops for good
    InvalidAuth,
    /// Anything else the transport forwarded
    Unrecognized { kind: String, payload: String },
}

impl SlackEvent {
    /// Get the event kind name used for logging and metrics
    pub fn kind(&self) -> &str {
        match self {
            Self::Hello => "hello",
            Self::Connected { .. } => "connected",
            Self::Message { .. } => "message",
            Self::PresenceChange { .. } => "presence_change",
            Self::LatencyReport { .. } => "latency_report",
            Self::DesktopNotification { .. } => "desktop_notification",
            Self::UserTyping { .. } => "user_typing",
            Self::Error { .. } => "error",
            Self::InvalidAuth => "invalid_auth",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }

    /// Whether this event ends the dispatch loop
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::InvalidAuth)
    }

    pub fn message(
        sender_id: impl Into<String>,
        text: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self::Message {
            sender_id: sender_id.into(),
            text: text.into(),
            channel_id: channel_id.into(),
        }
    }

    pub fn typing(sender_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self::UserTyping {
            sender_id: sender_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

/// Channel entry from the startup directory snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub name: String,
    pub id: String,
}

impl ChannelRecord {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// User entry from the startup directory snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    /// Handle or display name (may be empty)
    pub display_name: String,
    /// Full name from the profile (may be empty)
    pub real_name: String,
}

impl UserRecord {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        real_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            real_name: real_name.into(),
        }
    }

    /// Name shown to humans: real name first, then display name, then raw id
    pub fn preferred_name(&self) -> &str {
        if !self.real_name.is_empty() {
            &self.real_name
        } else if !self.display_name.is_empty() {
            &self.display_name
        } else {
            &self.id
        }
    }
}
