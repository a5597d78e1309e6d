use crate::domain::{
    ChannelRegistry, ChannelStats, MilestoneHistory, PostReceipt, ResolvedChannel,
};
use crate::error::TrackerError;
use chrono::NaiveDate;

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Looks up current statistics for a channel id.
/// Returns `Ok(None)` when the id does not name a channel.
pub trait StatsLookup {
    fn channel_stats(&self, channel_id: &str) -> Result<Option<ChannelStats>>;

    /// Subscriber count alone; implementations may fetch less than [`Self::channel_stats`]
    fn subscriber_count(&self, channel_id: &str) -> Result<Option<u64>> {
        Ok(self.channel_stats(channel_id)?.map(|s| s.subscriber_count))
    }
}

/// Resolves a free-text channel name to its best-matching channel
pub trait ChannelResolver {
    fn resolve(&self, name: &str) -> Result<Option<ResolvedChannel>>;
}

/// Publishes announcement text
/// This is a port (interface) that defines how the core reaches the outside world
pub trait Announcer: Send + Sync {
    fn publish(&self, text: &str) -> Result<PostReceipt>;
}

/// Whole-record persistence for the tracked-channel registry.
/// Missing or unreadable content loads as an empty registry.
pub trait RegistryStore {
    fn load(&self) -> Result<ChannelRegistry>;
    fn save(&self, registry: &ChannelRegistry) -> Result<()>;
}

/// Whole-record persistence for the milestone history log
pub trait HistoryStore {
    fn load(&self) -> Result<MilestoneHistory>;
    fn save(&self, history: &MilestoneHistory) -> Result<()>;
}

/// Source of candidate channel names for discovery
pub trait CandidateSource {
    fn load_names(&self) -> Result<Vec<String>>;
}

/// Supplies the date stamped on recorded milestones
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date from the system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}
