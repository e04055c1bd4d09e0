// ABOUTME: Root library module exposing the Slack transport, host identity and logging
// ABOUTME: Re-exports the dispatch engine from slagobot-core

pub mod host;
pub mod logging;
pub mod platform;

// Re-export platform-agnostic modules from slagobot-core
pub use slagobot_core::commands;
pub use slagobot_core::config;
pub use slagobot_core::directory;
pub use slagobot_core::dispatcher;
pub use slagobot_core::engagement;
pub use slagobot_core::events;
pub use slagobot_core::latency;
pub use slagobot_core::paths;
pub use slagobot_core::report;
pub use slagobot_core::traits;
