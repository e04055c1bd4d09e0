// ABOUTME: Platform transports for slagobot
// ABOUTME: Slack Socket Mode is the only realtime transport

pub mod slack;

pub use slack::SlackTransport;
