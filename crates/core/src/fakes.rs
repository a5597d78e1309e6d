//! In-memory test doubles for every port.

use crate::domain::{
    ChannelRegistry, ChannelStats, MilestoneHistory, PostReceipt, ResolvedChannel,
};
use crate::error::TrackerError;
use crate::ports::{
    Announcer, CandidateSource, ChannelResolver, Clock, HistoryStore, RegistryStore, Result,
    StatsLookup,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MemoryRegistryStore {
    inner: Arc<Mutex<ChannelRegistry>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryRegistryStore {
    pub fn with(registry: ChannelRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
            saves: Arc::default(),
        }
    }

    pub fn snapshot(&self) -> ChannelRegistry {
        self.inner.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl RegistryStore for MemoryRegistryStore {
    fn load(&self) -> Result<ChannelRegistry> {
        Ok(self.snapshot())
    }

    fn save(&self, registry: &ChannelRegistry) -> Result<()> {
        *self.inner.lock().unwrap() = registry.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryHistoryStore {
    inner: Arc<Mutex<MilestoneHistory>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryHistoryStore {
    pub fn snapshot(&self) -> MilestoneHistory {
        self.inner.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<MilestoneHistory> {
        Ok(self.snapshot())
    }

    fn save(&self, history: &MilestoneHistory) -> Result<()> {
        *self.inner.lock().unwrap() = history.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeStats {
    channels: Arc<Mutex<HashMap<String, ChannelStats>>>,
}

impl FakeStats {
    pub fn set(&self, channel_id: &str, title: &str, handle: &str, subscriber_count: u64) {
        self.channels.lock().unwrap().insert(
            channel_id.to_string(),
            ChannelStats {
                title: title.to_string(),
                handle: handle.to_string(),
                subscriber_count,
            },
        );
    }
}

impl StatsLookup for FakeStats {
    fn channel_stats(&self, channel_id: &str) -> Result<Option<ChannelStats>> {
        Ok(self.channels.lock().unwrap().get(channel_id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct FakeResolver {
    names: Arc<Mutex<HashMap<String, ResolvedChannel>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl FakeResolver {
    pub fn set(&self, name: &str, channel_id: &str, title: &str) {
        self.names.lock().unwrap().insert(
            name.to_string(),
            ResolvedChannel {
                channel_id: channel_id.to_string(),
                title: title.to_string(),
            },
        );
    }

    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().push(name.to_string());
    }
}

impl ChannelResolver for FakeResolver {
    fn resolve(&self, name: &str) -> Result<Option<ResolvedChannel>> {
        if self.failing.lock().unwrap().iter().any(|n| n == name) {
            return Err(TrackerError::external("resolver", format!("lookup of {name} failed")));
        }
        Ok(self.names.lock().unwrap().get(name).cloned())
    }
}

#[derive(Clone, Default)]
pub struct RecordingAnnouncer {
    posts: Arc<Mutex<Vec<String>>>,
    fail_next: Arc<AtomicBool>,
}

impl RecordingAnnouncer {
    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl Announcer for RecordingAnnouncer {
    fn publish(&self, text: &str) -> Result<PostReceipt> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(TrackerError::external("announcer", "service unavailable"));
        }
        let mut posts = self.posts.lock().unwrap();
        posts.push(text.to_string());
        Ok(PostReceipt {
            id: format!("post-{}", posts.len()),
        })
    }
}

#[derive(Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self(NaiveDate::from_ymd_opt(year, month, day).unwrap())
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub struct VecCandidates(pub Vec<String>);

impl CandidateSource for VecCandidates {
    fn load_names(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}
