// ABOUTME: Outbound posting to Slack channels via chat.postMessage
// ABOUTME: Splits long text into 4K-char chunks at line boundaries

use slack_morphism::prelude::*;
use slagobot_core::SendError;

/// Maximum message length for a single Slack mrkdwn text block
const MAX_MESSAGE_LENGTH: usize = 4000;

/// Post `text` to `channel_id`, splitting into chunks if it exceeds Slack's limit
pub async fn post_text(
    client: &SlackHyperClient,
    bot_token: &SlackApiToken,
    channel_id: &str,
    text: &str,
) -> Result<(), SendError> {
    if text.is_empty() {
        return Ok(());
    }

    let session = client.open_session(bot_token);
    for chunk in chunk_text(text, MAX_MESSAGE_LENGTH) {
        let req = SlackApiChatPostMessageRequest::new(
            channel_id.into(),
            SlackMessageContent::new().with_text(chunk.to_string()),
        );
        session
            .chat_post_message(&req)
            .await
            .map_err(|e| SendError::transport(channel_id, e))?;
    }
    Ok(())
}

/// Largest index <= `index` that falls on a char boundary
fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    (0..=index)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0)
}

/// Split text into chunks at line boundaries, falling back to character boundaries
fn chunk_text(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining);
            break;
        }

        let limit = floor_char_boundary(remaining, max_len);
        let split_at = if limit == 0 {
            // A single char wider than max_len still has to go out
            remaining
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(remaining.len())
        } else {
            remaining[..limit]
                .rfind('\n')
                .map(|pos| pos + 1)
                .unwrap_or(limit)
        };

        chunks.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }

    chunks
}
