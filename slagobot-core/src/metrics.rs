// ABOUTME: Metric recording helpers over the `metrics` facade
// ABOUTME: No-ops unless the binary installs an exporter

use metrics::counter;

pub fn record_event(kind: &str) {
    counter!("slagobot_events_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_command(name: &'static str) {
    counter!("slagobot_commands_total", "command" => name).increment(1);
}

pub fn record_nudge() {
    counter!("slagobot_nudges_total").increment(1);
}

pub fn record_message_sent() {
    counter!("slagobot_messages_sent_total").increment(1);
}

pub fn record_send_failure(reason: &'static str) {
    counter!("slagobot_send_failures_total", "reason" => reason).increment(1);
}
