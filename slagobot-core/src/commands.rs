// ABOUTME: Command matching for chat messages: admin-only !ip and !report, public !tr
// ABOUTME: Every rule is tested independently, so one message can produce several replies

use crate::report::HostIdentity;

pub const IP_COMMAND: &str = "!ip";
pub const REPORT_COMMAND: &str = "!report";
pub const TRANSLATE_PREFIX: &str = "!tr ";

/// Authorization and routing context resolved once at startup
#[derive(Debug, Clone, Default)]
pub struct AuthorizationContext {
    /// Primary admin user id
    pub admin_user_id: String,
    /// Extra admin user ids from configuration
    pub additional_admins: Vec<String>,
    /// Destination for command replies; empty means no destination
    pub default_channel_id: String,
}

impl AuthorizationContext {
    pub fn new(admin_user_id: impl Into<String>, default_channel_id: impl Into<String>) -> Self {
        Self {
            admin_user_id: admin_user_id.into(),
            additional_admins: Vec::new(),
            default_channel_id: default_channel_id.into(),
        }
    }

    pub fn with_additional_admins(mut self, admins: Vec<String>) -> Self {
        self.additional_admins = admins;
        self
    }

    /// Check whether `user_id` may run admin commands
    pub fn is_admin(&self, user_id: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        user_id == self.admin_user_id || self.additional_admins.iter().any(|a| a == user_id)
    }

    pub fn has_destination(&self) -> bool {
        !self.default_channel_id.is_empty()
    }
}

/// A recognized command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ip,
    Report,
    /// Translate the text following the `!tr ` prefix
    Translate { text: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ip => "ip",
            Command::Report => "report",
            Command::Translate { .. } => "tr",
        }
    }
}

/// Reply produced by a command, addressed to a channel id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub channel_id: String,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            text: text.into(),
        }
    }
}

/// Match `text` from `sender_id` against every command rule.
///
/// Rules are not exclusive: each one that matches contributes a command, in
/// rule order.
pub fn match_commands(sender_id: &str, text: &str, auth: &AuthorizationContext) -> Vec<Command> {
    let mut commands = Vec::new();
    let is_admin = auth.is_admin(sender_id);

    if is_admin && text == IP_COMMAND {
        commands.push(Command::Ip);
    }
    if is_admin && text == REPORT_COMMAND {
        commands.push(Command::Report);
    }
    if text.starts_with(TRANSLATE_PREFIX) {
        commands.push(Command::Translate {
            text: text.replacen(TRANSLATE_PREFIX, "", 1),
        });
    }

    commands
}

/// Placeholder translation; no translation backend is wired in
pub fn translate_placeholder(text: &str) -> String {
    format!("Translation of *{}*: xxxxx", text)
}

/// Turns message text into replies for the default channel
#[derive(Debug, Clone)]
pub struct CommandRouter {
    auth: AuthorizationContext,
    host: HostIdentity,
}

impl CommandRouter {
    pub fn new(auth: AuthorizationContext, host: HostIdentity) -> Self {
        Self { auth, host }
    }

    pub fn auth(&self) -> &AuthorizationContext {
        &self.auth
    }

    pub fn host(&self) -> &HostIdentity {
        &self.host
    }

    /// Produce zero or more replies for a message.
    ///
    /// `source_channel_id` is where the message was posted; replies always go
    /// to the default channel.
    pub fn route(
        &self,
        sender_id: &str,
        text: &str,
        source_channel_id: &str,
        latency: &str,
    ) -> Vec<OutboundMessage> {
        let commands = match_commands(sender_id, text, &self.auth);
        if !commands.is_empty() {
            tracing::debug!(
                sender = %sender_id,
                channel = %source_channel_id,
                count = commands.len(),
                "Commands matched"
            );
        }

        commands
            .into_iter()
            .map(|cmd| {
                crate::metrics::record_command(cmd.name());
                OutboundMessage::new(&self.auth.default_channel_id, self.render(&cmd, latency))
            })
            .collect()
    }

    fn render(&self, command: &Command, latency: &str) -> String {
        match command {
            Command::Ip => format!("My ip: {}. Latency: {}", self.host.outbound_ip, latency),
            Command::Report => self.host.report(latency),
            Command::Translate { text } => translate_placeholder(text),
        }
    }
}
