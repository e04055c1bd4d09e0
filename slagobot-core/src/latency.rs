// ABOUTME: Holds the most recent heartbeat latency sample as a display string

use std::time::Duration;

pub const NOT_CHECKED_YET: &str = "Not checked yet";

/// Most recently observed round-trip latency. No history is kept.
#[derive(Debug, Clone, Default)]
pub struct LatencyGauge {
    sample: Option<String>,
}

impl LatencyGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the current sample
    pub fn record(&mut self, sample: impl Into<String>) {
        self.sample = Some(sample.into());
    }

    /// Record a measured round trip, rendered like `123.456ms`
    pub fn record_duration(&mut self, value: Duration) {
        self.record(format!("{:?}", value));
    }

    pub fn current(&self) -> &str {
        self.sample.as_deref().unwrap_or(NOT_CHECKED_YET)
    }

    pub fn is_checked(&self) -> bool {
        self.sample.is_some()
    }
}
