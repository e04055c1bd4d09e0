// ABOUTME: Integration tests for the slagobot-core dispatcher
// ABOUTME: Drives event sequences through a mock OutboundSender and checks replies and state

use async_trait::async_trait;
use slagobot_core::{
    AuthorizationContext, ChannelRecord, CommandRouter, DirectoryCache, Dispatcher, HostIdentity,
    OutboundSender, SendError, SlackEvent, StopReason, UserRecord,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_stream::StreamExt;

/// Mock sender that records sent messages and can be told to fail
#[derive(Default)]
pub struct MockSender {
    sent: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl MockSender {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: Mutex::new(true),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl OutboundSender for MockSender {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), SendError> {
        if *self.fail.lock().unwrap() {
            return Err(SendError::transport(channel_id, "not_in_channel"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }
}

fn host() -> HostIdentity {
    HostIdentity {
        outbound_ip: "192.168.1.20".to_string(),
        external_ip: "203.0.113.50".to_string(),
        hostname: "slagobot-host".to_string(),
        platform: "linux/x86_64".to_string(),
    }
}

fn directory() -> DirectoryCache {
    let (cache, errors) = DirectoryCache::build::<String, String>(
        Ok(vec![
            ChannelRecord::new("general", "C1"),
            ChannelRecord::new("random", "C_DEFAULT"),
        ]),
        Ok(vec![UserRecord::new("U_BOB", "bob", "Bob Smith")]),
    );
    assert!(errors.is_empty());
    cache
}

fn setup_with(sender: MockSender) -> (Dispatcher<MockSender>, Arc<MockSender>) {
    let directory = directory();
    let default_channel = directory.resolve_default_channel("", "random");
    let router = CommandRouter::new(AuthorizationContext::new("U_ADMIN", default_channel), host());
    let sender = Arc::new(sender);
    (Dispatcher::new(Arc::clone(&sender), directory, router), sender)
}

fn setup() -> (Dispatcher<MockSender>, Arc<MockSender>) {
    setup_with(MockSender::default())
}

#[tokio::test]
async fn test_admin_ip_sends_once_to_default_channel() {
    let (mut dispatcher, sender) = setup();
    dispatcher
        .handle(SlackEvent::message("U_ADMIN", "!ip", "C1"))
        .await;

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "C_DEFAULT");
    assert!(sent[0].1.contains("192.168.1.20"));
    assert!(sent[0].1.contains("Not checked yet"));
}

#[tokio::test]
async fn test_non_admin_ip_sends_nothing() {
    let (mut dispatcher, sender) = setup();
    dispatcher
        .handle(SlackEvent::message("U_OTHER", "!ip", "C1"))
        .await;
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_translate_from_anyone() {
    let (mut dispatcher, sender) = setup();
    dispatcher
        .handle(SlackEvent::message("U_BOB", "!tr hello world", "C1"))
        .await;

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "C_DEFAULT");
    assert!(sent[0].1.contains("hello world"));
    assert!(sent[0].1.contains("xxxxx"));
}

#[tokio::test]
async fn test_ip_uses_latest_latency() {
    let (mut dispatcher, sender) = setup();
    dispatcher
        .handle(SlackEvent::LatencyReport {
            value: Duration::from_millis(120),
        })
        .await;
    dispatcher
        .handle(SlackEvent::message("U_ADMIN", "!ip", "C1"))
        .await;

    assert_eq!(
        sender.sent(),
        vec![(
            "C_DEFAULT".to_string(),
            "My ip: 192.168.1.20. Latency: 120ms".to_string()
        )]
    );
}

#[tokio::test]
async fn test_hello_sends_report_with_sentinel_latency() {
    let (mut dispatcher, sender) = setup();
    dispatcher.handle(SlackEvent::Hello).await;

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "C_DEFAULT");
    assert_eq!(sent[0].1, host().report("Not checked yet"));
}

#[tokio::test]
async fn test_connected_sends_greeting() {
    let (mut dispatcher, sender) = setup();
    dispatcher
        .handle(SlackEvent::Connected {
            info: "team T1".to_string(),
            connection_count: 1,
        })
        .await;
    assert_eq!(
        sender.sent(),
        vec![("C_DEFAULT".to_string(), "Hi, I'm connected!".to_string())]
    );
}

#[tokio::test]
async fn test_typing_nudge_fires_once_in_typing_channel() {
    let (mut dispatcher, sender) = setup();
    dispatcher
        .handle(SlackEvent::message("U_BOB", "morning", "C1"))
        .await;
    dispatcher.handle(SlackEvent::typing("U_BOB", "C1")).await;
    dispatcher.handle(SlackEvent::typing("U_BOB", "C1")).await;

    assert_eq!(
        sender.sent(),
        vec![(
            "C1".to_string(),
            "Wow! Bob Smith is typing! Say something wisdom!".to_string()
        )]
    );
}

#[tokio::test]
async fn test_typing_first_observation_never_nudges() {
    let (mut dispatcher, sender) = setup();
    dispatcher.handle(SlackEvent::typing("U_BOB", "C1")).await;
    assert!(sender.sent().is_empty());
    assert_eq!(dispatcher.engagement().state("U_BOB"), Some(false));
}

#[tokio::test]
async fn test_typing_unknown_user_falls_back_to_raw_id() {
    let (mut dispatcher, sender) = setup();
    dispatcher
        .handle(SlackEvent::message("U_GHOST", "boo", "C1"))
        .await;
    dispatcher.handle(SlackEvent::typing("U_GHOST", "C1")).await;

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("U_GHOST"));
}

#[tokio::test]
async fn test_posting_again_rearms_nudge() {
    let (mut dispatcher, sender) = setup();
    for _ in 0..2 {
        dispatcher
            .handle(SlackEvent::message("U_BOB", "hi", "C1"))
            .await;
        dispatcher.handle(SlackEvent::typing("U_BOB", "C1")).await;
    }
    assert_eq!(sender.sent().len(), 2);
}

#[tokio::test]
async fn test_invalid_auth_stops_before_remaining_events() {
    let (mut dispatcher, sender) = setup();
    let mut events = tokio_stream::iter(vec![
        SlackEvent::Connected {
            info: "team".to_string(),
            connection_count: 1,
        },
        SlackEvent::message("U_BOB", "hi", "C1"),
        SlackEvent::InvalidAuth,
        SlackEvent::message("U_ADMIN", "!ip", "C1"),
        SlackEvent::Hello,
    ]);

    let summary = dispatcher.run(&mut events).await;

    assert_eq!(summary.reason, StopReason::InvalidAuth);
    // Two events handled before the terminal one
    assert_eq!(summary.events_processed, 3);
    assert_eq!(sender.sent().len(), 1);

    // Fourth and fifth events were never pulled
    assert_eq!(
        events.next().await,
        Some(SlackEvent::message("U_ADMIN", "!ip", "C1"))
    );
    assert_eq!(events.next().await, Some(SlackEvent::Hello));
    assert_eq!(events.next().await, None);
}

#[tokio::test]
async fn test_stream_end_is_normal_shutdown() {
    let (mut dispatcher, _sender) = setup();
    let mut events = tokio_stream::iter(vec![
        SlackEvent::Hello,
        SlackEvent::Error {
            message: "socket hiccup".to_string(),
        },
        SlackEvent::Unrecognized {
            kind: "reaction_added".to_string(),
            payload: String::new(),
        },
    ]);

    let summary = dispatcher.run(&mut events).await;
    assert_eq!(summary.reason, StopReason::StreamEnded);
    assert_eq!(summary.events_processed, 3);
}

#[tokio::test]
async fn test_send_failures_do_not_stop_dispatch() {
    let (mut dispatcher, sender) = setup_with(MockSender::failing());
    let mut events = tokio_stream::iter(vec![
        SlackEvent::Hello,
        SlackEvent::message("U_ADMIN", "!report", "C1"),
        SlackEvent::LatencyReport {
            value: Duration::from_millis(5),
        },
    ]);

    let summary = dispatcher.run(&mut events).await;
    assert_eq!(summary.reason, StopReason::StreamEnded);
    assert_eq!(summary.events_processed, 3);
    assert_eq!(dispatcher.latency().current(), "5ms");

    sender.set_failing(false);
    dispatcher
        .handle(SlackEvent::message("U_ADMIN", "!ip", "C1"))
        .await;
    assert_eq!(sender.sent().len(), 1);
}

#[tokio::test]
async fn test_events_from_channel_are_consumed_in_order() {
    let (mut dispatcher, sender) = setup();
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let mut events = tokio_stream::wrappers::ReceiverStream::new(rx);

    tx.send(SlackEvent::message("U_ADMIN", "!ip", "C1")).await.unwrap();
    tx.send(SlackEvent::LatencyReport {
        value: Duration::from_millis(33),
    })
    .await
    .unwrap();
    tx.send(SlackEvent::message("U_ADMIN", "!ip", "C1")).await.unwrap();
    drop(tx);

    let summary = dispatcher.run(&mut events).await;
    assert_eq!(summary.events_processed, 3);

    let sent = sender.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.ends_with("Latency: Not checked yet"));
    assert!(sent[1].1.ends_with("Latency: 33ms"));
}

#[tokio::test]
async fn test_missing_default_channel_suppresses_command_replies() {
    let (directory, _) = DirectoryCache::build::<String, String>(
        Ok(vec![ChannelRecord::new("general", "C1")]),
        Ok(vec![]),
    );
    let default_channel = directory.resolve_default_channel("", "random");
    assert!(default_channel.is_empty());

    let router = CommandRouter::new(AuthorizationContext::new("U_ADMIN", default_channel), host());
    let sender = Arc::new(MockSender::default());
    let mut dispatcher = Dispatcher::new(Arc::clone(&sender), directory, router);

    dispatcher
        .handle(SlackEvent::message("U_ADMIN", "!report", "C1"))
        .await;
    dispatcher
        .handle(SlackEvent::message("U_BOB", "!tr hi", "C1"))
        .await;
    assert!(sender.sent().is_empty());

    // Typing replies use the event's own channel and still go out
    dispatcher.handle(SlackEvent::typing("U_BOB", "C1")).await;
    assert_eq!(sender.sent().len(), 1);
    assert_eq!(sender.sent()[0].0, "C1");
}
