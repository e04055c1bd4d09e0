// ABOUTME: Event dispatch and session-state engine for the slagobot Slack agent
// ABOUTME: Transport-agnostic: consumes SlackEvent streams and emits replies via OutboundSender

pub mod commands;
pub mod config;
pub mod directory;
pub mod dispatcher;
pub mod engagement;
pub mod error;
pub mod events;
pub mod latency;
pub mod metrics;
pub mod paths;
pub mod report;
pub mod traits;

pub use commands::{AuthorizationContext, CommandRouter, OutboundMessage};
pub use directory::DirectoryCache;
pub use dispatcher::{DispatchSummary, Dispatcher, Flow, StopReason};
pub use engagement::EngagementTracker;
pub use error::{DirectoryError, SendError};
pub use events::{ChannelRecord, SlackEvent, UserRecord};
pub use latency::LatencyGauge;
pub use report::{format_report, HostIdentity};
pub use traits::{EventStream, OutboundSender, RealtimeTransport};
