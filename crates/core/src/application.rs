use crate::announcement;
use crate::domain::{ChannelRegistry, TrackedChannel, NOT_FOUND_KEY};
use crate::error::TrackerError;
use crate::milestone;
use crate::ports::{Announcer, Clock, HistoryStore, RegistryStore, Result, StatsLookup};

/// What to do when checking one channel fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run at the first failing channel
    #[default]
    Halt,
    /// Log the failure and move on to the next channel
    KeepGoing,
}

/// Result of one channel's check cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub channel_id: String,
    pub name: String,
    pub subscriber_count: u64,
    pub crossed: Vec<u64>,
    pub target: u64,
    pub post_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFailure {
    pub channel_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub outcomes: Vec<ChannelOutcome>,
    pub failures: Vec<ChannelFailure>,
}

impl CheckReport {
    /// Number of channels that crossed at least one milestone
    pub fn announced(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.crossed.is_empty()).count()
    }
}

/// Application service that detects, records and announces milestone crossings
pub struct MilestoneCheckService {
    registry_store: Box<dyn RegistryStore>,
    history_store: Box<dyn HistoryStore>,
    stats: Box<dyn StatsLookup>,
    announcer: Box<dyn Announcer>,
    clock: Box<dyn Clock>,
    policy: FailurePolicy,
}

impl MilestoneCheckService {
    /// Creates a new MilestoneCheckService with the given dependencies
    pub fn new(
        registry_store: Box<dyn RegistryStore>,
        history_store: Box<dyn HistoryStore>,
        stats: Box<dyn StatsLookup>,
        announcer: Box<dyn Announcer>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            registry_store,
            history_store,
            stats,
            announcer,
            clock,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs one check cycle over every tracked channel, in registry order
    pub fn run_check(&self) -> Result<CheckReport> {
        let mut registry = self.registry_store.load()?;
        let entries: Vec<(String, TrackedChannel)> = registry
            .channels
            .iter()
            .map(|(id, channel)| (id.clone(), channel.clone()))
            .collect();

        let mut report = CheckReport::default();
        for (channel_id, channel) in entries {
            if channel_id == NOT_FOUND_KEY {
                tracing::debug!(name = %channel.name, "skipping unresolved discovery entry");
                continue;
            }

            match self.check_channel(&mut registry, &channel_id, &channel) {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) if self.policy == FailurePolicy::KeepGoing => {
                    tracing::warn!(%channel_id, error = %e, "channel check failed, continuing");
                    report.failures.push(ChannelFailure {
                        channel_id,
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    fn check_channel(
        &self,
        registry: &mut ChannelRegistry,
        channel_id: &str,
        channel: &TrackedChannel,
    ) -> Result<ChannelOutcome> {
        let stats = self
            .stats
            .channel_stats(channel_id)?
            .ok_or_else(|| TrackerError::ChannelNotFound(channel_id.to_string()))?;

        let advancement = milestone::advance(stats.subscriber_count, channel.target);

        // History first: if anything below fails the target is still unadvanced
        // and the next run re-derives the same crossings.
        for crossed in &advancement.crossed {
            self.record_milestone(channel_id, &stats.handle, *crossed)?;
        }

        let mut post_id = None;
        if advancement.is_empty() {
            tracing::info!(
                "{} is at {} subscribers. Target: {}",
                stats.title,
                stats.subscriber_count,
                advancement.target
            );
        } else {
            let text = announcement::compose(&stats.title, &stats.handle, &advancement.crossed);
            let receipt = self.announcer.publish(&text)?;
            tracing::info!(post_id = %receipt.id, "announced milestones for {}", stats.title);
            post_id = Some(receipt.id);

            registry.insert(
                channel_id,
                TrackedChannel {
                    name: stats.title.clone(),
                    target: advancement.target,
                },
            );
            self.registry_store.save(registry)?;
            tracing::info!("Updated {} milestone. New target: {}", stats.title, advancement.target);
        }

        Ok(ChannelOutcome {
            channel_id: channel_id.to_string(),
            name: stats.title,
            subscriber_count: stats.subscriber_count,
            crossed: advancement.crossed,
            target: advancement.target,
            post_id,
        })
    }

    /// Durably appends one milestone to the channel's history, dated today
    pub fn record_milestone(&self, channel_id: &str, handle: &str, milestone: u64) -> Result<()> {
        let mut history = self.history_store.load()?;
        history.record(channel_id, handle, milestone, self.clock.today());
        self.history_store.save(&history)?;
        tracing::info!("Milestone {} added for channel {} ({})", milestone, handle, channel_id);
        Ok(())
    }
}
