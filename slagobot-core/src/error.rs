// ABOUTME: Recoverable error types surfaced by the core engine
// ABOUTME: Directory snapshot failures and outbound send failures

use thiserror::Error;

/// A directory snapshot could not be obtained. The cache degrades to
/// "not found" for the affected table instead of failing the process.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Partial directory: {kind} snapshot unavailable: {reason}")]
    PartialDirectory { kind: &'static str, reason: String },
}

impl DirectoryError {
    pub fn channels(reason: impl std::fmt::Display) -> Self {
        DirectoryError::PartialDirectory {
            kind: "channel",
            reason: reason.to_string(),
        }
    }

    pub fn users(reason: impl std::fmt::Display) -> Self {
        DirectoryError::PartialDirectory {
            kind: "user",
            reason: reason.to_string(),
        }
    }
}

/// Outbound delivery failure. Always logged, never retried.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("No destination channel available")]
    EmptyDestination,

    #[error("Transport error sending to {channel_id}: {reason}")]
    Transport { channel_id: String, reason: String },
}

impl SendError {
    pub fn transport(channel_id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SendError::Transport {
            channel_id: channel_id.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_directory_message_names_kind() {
        let err = DirectoryError::channels("timeout");
        let text = err.to_string();
        assert!(text.contains("channel"));
        assert!(text.contains("timeout"));
    }

    #[test]
    fn test_transport_error_names_channel() {
        let err = SendError::transport("C123", "channel_not_found");
        assert!(err.to_string().contains("C123"));
        assert!(err.to_string().contains("channel_not_found"));
    }
}
