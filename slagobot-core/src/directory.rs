// ABOUTME: Directory cache mapping channel names <-> ids and user ids -> display names
// ABOUTME: Built once from the startup snapshot, never pruned or mutated afterwards

use crate::error::DirectoryError;
use crate::events::{ChannelRecord, UserRecord};
use std::collections::HashMap;

/// Bidirectional channel lookup plus user display names.
///
/// Lookups on a cache built from a failed snapshot simply return `None`.
#[derive(Debug, Default, Clone)]
pub struct DirectoryCache {
    channel_ids_by_name: HashMap<String, String>,
    channel_names_by_id: HashMap<String, String>,
    user_names_by_id: HashMap<String, String>,
}

impl DirectoryCache {
    /// Build the cache from the two snapshot results.
    ///
    /// A snapshot that could not be obtained leaves its table empty and is
    /// reported back as a `DirectoryError::PartialDirectory`.
    pub fn build<CE, UE>(
        channels: Result<Vec<ChannelRecord>, CE>,
        users: Result<Vec<UserRecord>, UE>,
    ) -> (Self, Vec<DirectoryError>)
    where
        CE: std::fmt::Display,
        UE: std::fmt::Display,
    {
        let mut cache = Self::default();
        let mut errors = Vec::new();

        match channels {
            Ok(records) => cache.insert_channels(records),
            Err(e) => {
                let err = DirectoryError::channels(e);
                tracing::warn!(error = %err, "Channel directory unavailable");
                errors.push(err);
            }
        }

        match users {
            Ok(records) => cache.insert_users(records),
            Err(e) => {
                let err = DirectoryError::users(e);
                tracing::warn!(error = %err, "User directory unavailable");
                errors.push(err);
            }
        }

        tracing::info!(
            channels = cache.channel_count(),
            users = cache.user_count(),
            "Directory cache built"
        );

        (cache, errors)
    }

    fn insert_channels(&mut self, records: Vec<ChannelRecord>) {
        for record in records {
            // First record wins so both maps stay mirror images
            if self.channel_ids_by_name.contains_key(&record.name)
                || self.channel_names_by_id.contains_key(&record.id)
            {
                tracing::warn!(
                    name = %record.name,
                    id = %record.id,
                    "Skipping duplicate channel in snapshot"
                );
                continue;
            }
            tracing::debug!(name = %record.name, id = %record.id, "Channel");
            self.channel_names_by_id
                .insert(record.id.clone(), record.name.clone());
            self.channel_ids_by_name.insert(record.name, record.id);
        }
    }

    fn insert_users(&mut self, records: Vec<UserRecord>) {
        for record in records {
            tracing::debug!(
                id = %record.id,
                name = %record.display_name,
                real_name = %record.real_name,
                "User"
            );
            let name = record.preferred_name().to_string();
            self.user_names_by_id.entry(record.id).or_insert(name);
        }
    }

    pub fn channel_id_by_name(&self, name: &str) -> Option<&str> {
        self.channel_ids_by_name.get(name).map(String::as_str)
    }

    pub fn channel_name_by_id(&self, id: &str) -> Option<&str> {
        self.channel_names_by_id.get(id).map(String::as_str)
    }

    pub fn user_display_name(&self, id: &str) -> Option<&str> {
        self.user_names_by_id.get(id).map(String::as_str)
    }

    /// Resolve the destination for non-typing replies.
    ///
    /// Returns the id for `configured` when it is non-empty and known, else the
    /// id for `fallback`, else an empty string meaning "no destination".
    pub fn resolve_default_channel(&self, configured: &str, fallback: &str) -> String {
        if !configured.is_empty() {
            if let Some(id) = self.channel_id_by_name(configured) {
                return id.to_string();
            }
            tracing::warn!(
                channel = %configured,
                fallback = %fallback,
                "Configured channel not found, trying fallback"
            );
        }
        self.channel_id_by_name(fallback)
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn channel_count(&self) -> usize {
        self.channel_ids_by_name.len()
    }

    pub fn user_count(&self) -> usize {
        self.user_names_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel_count() == 0 && self.user_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Vec<ChannelRecord> {
        vec![
            ChannelRecord::new("general", "C001"),
            ChannelRecord::new("random", "C002"),
            ChannelRecord::new("ops", "C003"),
        ]
    }

    fn build(channels: Vec<ChannelRecord>) -> DirectoryCache {
        let (cache, errors) = DirectoryCache::build::<String, String>(Ok(channels), Ok(vec![]));
        assert!(errors.is_empty());
        cache
    }

    #[test]
    fn test_bidirectional_lookup_round_trips() {
        let cache = build(snapshot());
        for record in snapshot() {
            let name = cache.channel_name_by_id(&record.id).unwrap();
            assert_eq!(cache.channel_id_by_name(name), Some(record.id.as_str()));
            let id = cache.channel_id_by_name(&record.name).unwrap();
            assert_eq!(cache.channel_name_by_id(id), Some(record.name.as_str()));
        }
    }

    #[test]
    fn test_resolve_default_prefers_configured() {
        let cache = build(snapshot());
        assert_eq!(cache.resolve_default_channel("ops", "random"), "C003");
    }

    #[test]
    fn test_resolve_default_empty_uses_fallback() {
        let cache = build(snapshot());
        assert_eq!(
            cache.resolve_default_channel("", "random"),
            cache.channel_id_by_name("random").unwrap()
        );
    }

    #[test]
    fn test_resolve_default_unknown_configured_uses_fallback() {
        let cache = build(snapshot());
        assert_eq!(cache.resolve_default_channel("nope", "random"), "C002");
    }

    #[test]
    fn test_resolve_default_neither_present_is_empty() {
        let cache = build(vec![ChannelRecord::new("general", "C001")]);
        assert_eq!(cache.resolve_default_channel("", "random"), "");
    }

    #[test]
    fn test_duplicate_channels_first_wins() {
        let cache = build(vec![
            ChannelRecord::new("general", "C001"),
            ChannelRecord::new("general", "C999"),
            ChannelRecord::new("other", "C001"),
        ]);
        assert_eq!(cache.channel_count(), 1);
        assert_eq!(cache.channel_id_by_name("general"), Some("C001"));
        assert_eq!(cache.channel_name_by_id("C001"), Some("general"));
        assert!(cache.channel_name_by_id("C999").is_none());
        assert!(cache.channel_id_by_name("other").is_none());
    }

    #[test]
    fn test_failed_channel_snapshot_degrades_to_not_found() {
        let users = vec![UserRecord::new("U1", "bob", "Bob Smith")];
        let (cache, errors) =
            DirectoryCache::build(Err::<Vec<ChannelRecord>, _>("ratelimited"), Ok::<_, String>(users));
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            DirectoryError::PartialDirectory { kind: "channel", .. }
        ));
        assert!(cache.channel_id_by_name("general").is_none());
        assert_eq!(cache.resolve_default_channel("general", "random"), "");
        assert_eq!(cache.user_display_name("U1"), Some("Bob Smith"));
    }

    #[test]
    fn test_both_snapshots_failed() {
        let (cache, errors) = DirectoryCache::build::<&str, &str>(Err("down"), Err("down"));
        assert_eq!(errors.len(), 2);
        assert!(cache.is_empty());
        assert!(cache.user_display_name("U1").is_none());
    }

    #[test]
    fn test_user_display_name_lookup() {
        let users = vec![
            UserRecord::new("U1", "bob", "Bob Smith"),
            UserRecord::new("U2", "alice", ""),
        ];
        let (cache, _) = DirectoryCache::build::<String, String>(Ok(vec![]), Ok(users));
        assert_eq!(cache.user_display_name("U1"), Some("Bob Smith"));
        assert_eq!(cache.user_display_name("U2"), Some("alice"));
        assert_eq!(cache.user_display_name("U3"), None);
    }
}
