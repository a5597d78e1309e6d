use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One million subscribers, the unit every milestone is a multiple of
pub const MILLION: u64 = 1_000_000;

/// Registry key shared by every candidate discovery could not place
pub const NOT_FOUND_KEY: &str = "not found";

/// A channel the checker tracks, keyed by channel id in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedChannel {
    pub name: String,
    pub target: u64,
}

/// Tracked channels keyed by channel id, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelRegistry {
    pub channels: IndexMap<String, TrackedChannel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, channel_id: &str) -> Option<&TrackedChannel> {
        self.channels.get(channel_id)
    }

    /// Inserts or replaces the entry for `channel_id`, keeping its original position
    pub fn insert(&mut self, channel_id: impl Into<String>, channel: TrackedChannel) {
        self.channels.insert(channel_id.into(), channel);
    }

    /// True when `name` occurs inside the display name of any entry
    pub fn contains_name(&self, name: &str) -> bool {
        self.channels.values().any(|c| c.name.contains(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRecord {
    pub milestone: u64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHistory {
    pub username: String,
    pub history: Vec<MilestoneRecord>,
}

/// Milestone crossings keyed by channel id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilestoneHistory {
    pub channels: IndexMap<String, ChannelHistory>,
}

impl MilestoneHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel_id: &str) -> Option<&ChannelHistory> {
        self.channels.get(channel_id)
    }

    /// Appends one crossing for `channel_id`, creating the entry on first use
    /// and overwriting the stored handle when the channel has renamed.
    ///
    /// No deduplication is done: recording the same milestone twice yields two rows.
    pub fn record(&mut self, channel_id: &str, username: &str, milestone: u64, date: NaiveDate) {
        let record = MilestoneRecord { milestone, date };
        match self.channels.get_mut(channel_id) {
            Some(entry) => {
                if entry.username != username {
                    tracing::info!(
                        channel_id,
                        old = %entry.username,
                        new = %username,
                        "channel handle changed, updating"
                    );
                    entry.username = username.to_string();
                }
                entry.history.push(record);
            }
            None => {
                tracing::info!(channel_id, username, "added new channel to milestone history");
                self.channels.insert(
                    channel_id.to_string(),
                    ChannelHistory {
                        username: username.to_string(),
                        history: vec![record],
                    },
                );
            }
        }
    }
}

/// Current statistics for a channel as reported by the stats lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStats {
    pub title: String,
    pub handle: String,
    pub subscriber_count: u64,
}

/// Best match for a free-text channel name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChannel {
    pub channel_id: String,
    pub title: String,
}

/// Confirmation returned by the announcer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_record_creates_entry_for_fresh_channel() {
        let mut history = MilestoneHistory::new();
        history.record("UC1", "@one", 24_000_000, day(1));

        let entry = history.get("UC1").unwrap();
        assert_eq!(entry.username, "@one");
        assert_eq!(
            entry.history,
            vec![MilestoneRecord { milestone: 24_000_000, date: day(1) }]
        );
    }

    #[test]
    fn test_record_appends_in_call_order() {
        let mut history = MilestoneHistory::new();
        history.record("UC1", "@one", 24_000_000, day(1));
        history.record("UC1", "@one", 25_000_000, day(1));

        let milestones: Vec<u64> = history.get("UC1").unwrap().history.iter().map(|r| r.milestone).collect();
        assert_eq!(milestones, vec![24_000_000, 25_000_000]);
    }

    #[test]
    fn test_record_updates_renamed_handle() {
        let mut history = MilestoneHistory::new();
        history.record("UC1", "@old", 24_000_000, day(1));
        history.record("UC1", "@new", 25_000_000, day(2));

        let entry = history.get("UC1").unwrap();
        assert_eq!(entry.username, "@new");
        assert_eq!(entry.history.len(), 2);
    }

    #[test]
    fn test_record_does_not_deduplicate() {
        let mut history = MilestoneHistory::new();
        history.record("UC1", "@one", 24_000_000, day(1));
        history.record("UC1", "@one", 24_000_000, day(1));

        assert_eq!(history.get("UC1").unwrap().history.len(), 2);
    }

    #[test]
    fn test_registry_contains_name_is_substring_match() {
        let mut registry = ChannelRegistry::new();
        registry.insert("UC1", TrackedChannel { name: "Example Channel".into(), target: 2_000_000 });

        assert!(registry.contains_name("Example"));
        assert!(registry.contains_name("Example Channel"));
        assert!(!registry.contains_name("example"));
    }

    #[test]
    fn test_registry_insert_keeps_position_on_replace() {
        let mut registry = ChannelRegistry::new();
        registry.insert("a", TrackedChannel { name: "A".into(), target: 1_000_000 });
        registry.insert("b", TrackedChannel { name: "B".into(), target: 1_000_000 });
        registry.insert("a", TrackedChannel { name: "A2".into(), target: 2_000_000 });

        let keys: Vec<&String> = registry.channels.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().target, 2_000_000);
    }

    #[test]
    fn test_history_serializes_to_flat_record() {
        let mut history = MilestoneHistory::new();
        history.record("UC1", "@one", 24_000_000, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());

        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "UC1": {
                    "username": "@one",
                    "history": [{"milestone": 24000000, "date": "2024-01-05"}]
                }
            })
        );
    }
}
