// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Admin identity, default channel, Slack tokens, heartbeat and metrics settings
use crate::commands::AuthorizationContext;
use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Channel used when no channel is configured
pub const DEFAULT_CHANNEL_NAME: &str = "random";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// User id allowed to run admin commands
    #[serde(default)]
    pub admin: String,
    /// Extra admin user ids
    #[serde(default)]
    pub admins: Vec<String>,
    /// Default channel name; empty falls back to "random"
    #[serde(default)]
    pub channel: String,
}

impl BotConfig {
    /// Channel name to resolve as the default destination
    pub fn default_channel_name(&self) -> &str {
        let channel = self.channel.trim();
        if channel.is_empty() {
            DEFAULT_CHANNEL_NAME
        } else {
            channel
        }
    }

    /// Build the authorization context once the default channel id is known
    pub fn authorization(&self, default_channel_id: impl Into<String>) -> AuthorizationContext {
        AuthorizationContext::new(self.admin.clone(), default_channel_id)
            .with_additional_admins(self.admins.clone())
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot OAuth token (xoxb-...) for Web API calls
    #[serde(default)]
    pub bot_token: String,
    /// App-level token (xapp-...) for Socket Mode connections
    #[serde(default)]
    pub app_token: String,
    /// Seconds between latency heartbeats
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            app_token: String::new(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

// Custom Debug impl to redact bot_token, app_token
impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field("app_token", &"[REDACTED]")
            .field("heartbeat_secs", &self.heartbeat_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Address for the Prometheus exporter; disabled when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Find the config file, checking multiple locations in order:
    /// 1. explicit path (from --config-path)
    /// 2. SLAGOBOT_CONFIG_PATH env var (if set)
    /// 3. ./config.toml (current directory)
    /// 4. ~/.config/slagobot/config.toml
    fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Some(path.to_path_buf());
            }
            tracing::warn!(path = %path.display(), "Config path does not exist");
        }

        if let Ok(env_path) = std::env::var("SLAGOBOT_CONFIG_PATH") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Some(path);
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        let xdg_config = paths::config_file();
        if xdg_config.exists() {
            return Some(xdg_config);
        }

        None
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str::<Config>(content).context("Failed to parse configuration")
    }

    /// Load configuration from file with environment variable overrides.
    ///
    /// A missing file yields defaults; an unparseable one is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(config_path) = Self::find_config_file(explicit) {
            tracing::info!(path = %config_path.display(), "Loading configuration from file");
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            tracing::info!("No config file found, using environment variables and defaults");
            Config::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        // SLACK_TOKEN kept for compatibility with older deployments
        if let Ok(val) = std::env::var("SLACK_TOKEN") {
            self.slack.bot_token = val;
        }
        if let Ok(val) = std::env::var("SLACK_BOT_TOKEN") {
            self.slack.bot_token = val;
        }
        if let Ok(val) = std::env::var("SLACK_APP_TOKEN") {
            self.slack.app_token = val;
        }
        if let Ok(val) = std::env::var("SLACK_HEARTBEAT_SECS") {
            self.slack.heartbeat_secs = val.parse().with_context(|| {
                format!("SLACK_HEARTBEAT_SECS must be a valid number, got: {}", val)
            })?;
        }
        if let Ok(val) = std::env::var("SLAGOBOT_ADMIN") {
            self.bot.admin = val;
        }
        if let Ok(val) = std::env::var("SLAGOBOT_ADMINS") {
            self.bot.admins = split_list(&val);
        }
        if let Ok(val) = std::env::var("SLAGOBOT_CHANNEL") {
            self.bot.channel = val;
        }
        if let Ok(val) = std::env::var("SLAGOBOT_METRICS_LISTEN") {
            self.metrics.listen = Some(val);
        }
        Ok(())
    }

    /// Check that the fields needed to connect are present
    pub fn validate(&self) -> Result<()> {
        if self.slack.bot_token.trim().is_empty() {
            anyhow::bail!(
                "slack.bot_token is required (set in config.toml, --slack-token, or SLACK_TOKEN env var)"
            );
        }
        if self.slack.app_token.trim().is_empty() {
            anyhow::bail!(
                "slack.app_token is required for Socket Mode (set in config.toml or SLACK_APP_TOKEN env var)"
            );
        }
        if self.slack.heartbeat_secs == 0 {
            anyhow::bail!("slack.heartbeat_secs must be greater than zero");
        }
        if self.bot.admin.trim().is_empty() {
            tracing::warn!("No admin configured; admin commands are disabled");
        }
        Ok(())
    }
}
