use crate::domain::{TrackedChannel, MILLION, NOT_FOUND_KEY};
use crate::milestone;
use crate::ports::{CandidateSource, ChannelResolver, RegistryStore, Result, StatsLookup};

/// Inclusive subscriber floor a candidate must reach to be tracked
pub const DEFAULT_MIN_SUBSCRIBERS: u64 = 10 * MILLION;

/// How a single candidate name resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    Eligible {
        channel_id: String,
        title: String,
        subscriber_count: u64,
        target: u64,
    },
    /// The resolver had no match for the name
    Unresolved,
    /// Resolved, but under the floor or without a visible subscriber count
    BelowFloor { subscriber_count: Option<u64> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Channel ids added to the registry
    pub added: Vec<String>,
    /// Names already present in the registry
    pub skipped: Vec<String>,
    /// Names that went to the "not found" entry
    pub not_found: Vec<String>,
}

/// Seeds the channel registry from a list of candidate channel names
pub struct DiscoveryService {
    candidates: Box<dyn CandidateSource>,
    resolver: Box<dyn ChannelResolver>,
    stats: Box<dyn StatsLookup>,
    registry_store: Box<dyn RegistryStore>,
    min_subscribers: u64,
}

impl DiscoveryService {
    pub fn new(
        candidates: Box<dyn CandidateSource>,
        resolver: Box<dyn ChannelResolver>,
        stats: Box<dyn StatsLookup>,
        registry_store: Box<dyn RegistryStore>,
    ) -> Self {
        Self {
            candidates,
            resolver,
            stats,
            registry_store,
            min_subscribers: DEFAULT_MIN_SUBSCRIBERS,
        }
    }

    pub fn with_min_subscribers(mut self, min_subscribers: u64) -> Self {
        self.min_subscribers = min_subscribers;
        self
    }

    /// Processes every candidate in order, saving the registry after each one
    /// so an aborted run keeps what it already found.
    ///
    /// Unresolved and under-floor candidates all share the [`NOT_FOUND_KEY`]
    /// entry, so only the last of them survives in the saved registry.
    pub fn run_discovery(&self) -> Result<DiscoveryReport> {
        let names = self.candidates.load_names()?;
        let mut registry = self.registry_store.load()?;
        let mut report = DiscoveryReport::default();

        for name in names {
            tracing::debug!("Processing channel: {}", name);
            if registry.contains_name(&name) {
                tracing::debug!("Skipping {}, already processed.", name);
                report.skipped.push(name);
                continue;
            }

            match self.resolve_candidate(&name)? {
                CandidateOutcome::Eligible {
                    channel_id,
                    title,
                    subscriber_count,
                    target,
                } => {
                    tracing::info!(
                        "Added {} with current subscribers : {} and target subscribers : {}.",
                        title,
                        subscriber_count,
                        target
                    );
                    registry.insert(channel_id.clone(), TrackedChannel { name: title, target });
                    report.added.push(channel_id);
                }
                CandidateOutcome::Unresolved | CandidateOutcome::BelowFloor { .. } => {
                    tracing::info!("Channel {} not found.", name);
                    registry.insert(
                        NOT_FOUND_KEY,
                        TrackedChannel {
                            name: name.clone(),
                            target: 0,
                        },
                    );
                    report.not_found.push(name);
                }
            }

            self.registry_store.save(&registry)?;
        }

        self.registry_store.save(&registry)?;
        Ok(report)
    }

    /// Resolves one name and decides whether it meets the subscriber floor
    pub fn resolve_candidate(&self, name: &str) -> Result<CandidateOutcome> {
        let Some(resolved) = self.resolver.resolve(name)? else {
            return Ok(CandidateOutcome::Unresolved);
        };

        let subscriber_count = self.stats.subscriber_count(&resolved.channel_id)?;

        match subscriber_count {
            Some(count) if count >= self.min_subscribers => Ok(CandidateOutcome::Eligible {
                channel_id: resolved.channel_id,
                title: resolved.title,
                subscriber_count: count,
                target: milestone::seed_target(count),
            }),
            _ => Ok(CandidateOutcome::BelowFloor { subscriber_count }),
        }
    }
}
