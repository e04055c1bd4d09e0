// ABOUTME: Per-user engagement tracking for the one-shot typing nudge
// ABOUTME: Posting a message arms a user; the next observed typing consumes the arm

use std::collections::HashMap;

/// Tracks whether a nudge is pending for each user.
///
/// An absent entry means the user has not been observed yet, `true` means a
/// nudge is armed, `false` means the user was already nudged (or first seen
/// typing) and stays quiet until they post again.
#[derive(Debug, Default)]
pub struct EngagementTracker {
    armed: HashMap<String, bool>,
}

impl EngagementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the nudge for `user_id`
    pub fn mark_engaged(&mut self, user_id: &str) {
        self.armed.insert(user_id.to_string(), true);
    }

    /// Disarm and return `true` if a nudge was pending for `user_id`.
    ///
    /// The first observation of a user through this call records them as
    /// disarmed and never fires.
    pub fn consume_if_armed(&mut self, user_id: &str) -> bool {
        match self.armed.get_mut(user_id) {
            Some(armed) => std::mem::replace(armed, false),
            None => {
                self.armed.insert(user_id.to_string(), false);
                false
            }
        }
    }

    pub fn state(&self, user_id: &str) -> Option<bool> {
        self.armed.get(user_id).copied()
    }

    /// Number of distinct users observed this session
    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}
