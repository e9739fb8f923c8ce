use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use tokio::sync::watch;

use crate::types::{
    ActiveLists, DashboardData, EmergingTopicData, EventData, PollingState, SentimentData,
    SubredditData, TrendData,
};

// ---------------------------------------------------------------------------
// SnapshotStore
// ---------------------------------------------------------------------------

/// Latest display snapshots, replaced wholesale each refresh cycle and read
/// by the API handlers. Singleton snapshots start empty and stay empty until
/// the first successful fetch; nothing survives a restart.
///
/// The refresh marker is a watch channel so consumers can observe "data just
/// landed" without polling a hidden global. Marking with an unchanged value
/// does not wake subscribers.
pub struct SnapshotStore {
    dashboard: RwLock<Option<DashboardData>>,
    trends: RwLock<Option<TrendData>>,
    sentiment: RwLock<Option<SentimentData>>,
    emerging: RwLock<Option<EmergingTopicData>>,
    polling: RwLock<Option<PollingState>>,
    active_lists: RwLock<Option<ActiveLists>>,
    /// subreddit name → latest payload. Watched subreddits are refreshed
    /// every cycle; the rest are filled on demand by the API and aged out
    /// at the next cycle.
    subreddits: DashMap<String, SubredditData>,
    /// event id → latest payload, filled on demand and aged out at the
    /// next cycle.
    events: DashMap<String, EventData>,
    refresh_tx: watch::Sender<Option<String>>,
}

impl SnapshotStore {
    pub fn new() -> Arc<Self> {
        let (refresh_tx, _) = watch::channel(None);
        Arc::new(Self {
            dashboard: RwLock::new(None),
            trends: RwLock::new(None),
            sentiment: RwLock::new(None),
            emerging: RwLock::new(None),
            polling: RwLock::new(None),
            active_lists: RwLock::new(None),
            subreddits: DashMap::new(),
            events: DashMap::new(),
            refresh_tx,
        })
    }

    // --- singleton snapshots ---

    pub fn set_dashboard(&self, data: DashboardData) {
        if let Ok(mut guard) = self.dashboard.write() {
            *guard = Some(data);
        }
    }

    pub fn dashboard(&self) -> Option<DashboardData> {
        self.dashboard.read().ok()?.clone()
    }

    pub fn set_trends(&self, data: TrendData) {
        if let Ok(mut guard) = self.trends.write() {
            *guard = Some(data);
        }
    }

    pub fn trends(&self) -> Option<TrendData> {
        self.trends.read().ok()?.clone()
    }

    pub fn set_sentiment(&self, data: SentimentData) {
        if let Ok(mut guard) = self.sentiment.write() {
            *guard = Some(data);
        }
    }

    pub fn sentiment(&self) -> Option<SentimentData> {
        self.sentiment.read().ok()?.clone()
    }

    pub fn set_emerging(&self, data: EmergingTopicData) {
        if let Ok(mut guard) = self.emerging.write() {
            *guard = Some(data);
        }
    }

    pub fn emerging(&self) -> Option<EmergingTopicData> {
        self.emerging.read().ok()?.clone()
    }

    /// Store the latest polling state. Returns true when the stored value
    /// actually changed, so callers can publish change events without
    /// spamming subscribers every probe.
    pub fn set_polling(&self, state: PollingState) -> bool {
        if let Ok(mut guard) = self.polling.write() {
            if guard.as_ref() == Some(&state) {
                return false;
            }
            *guard = Some(state);
            return true;
        }
        false
    }

    pub fn polling(&self) -> Option<PollingState> {
        self.polling.read().ok()?.clone()
    }

    pub fn set_active_lists(&self, lists: ActiveLists) {
        if let Ok(mut guard) = self.active_lists.write() {
            *guard = Some(lists);
        }
    }

    pub fn active_lists(&self) -> Option<ActiveLists> {
        self.active_lists.read().ok()?.clone()
    }

    // --- keyed caches ---

    pub fn set_subreddit(&self, name: &str, data: SubredditData) {
        self.subreddits.insert(name.to_string(), data);
    }

    pub fn subreddit(&self, name: &str) -> Option<SubredditData> {
        self.subreddits.get(name).map(|entry| entry.clone())
    }

    pub fn set_event(&self, event_id: &str, data: EventData) {
        self.events.insert(event_id.to_string(), data);
    }

    pub fn event(&self, event_id: &str) -> Option<EventData> {
        self.events.get(event_id).map(|entry| entry.clone())
    }

    pub fn cached_subreddit_count(&self) -> usize {
        self.subreddits.len()
    }

    /// Drop every keyed payload that was filled on demand. Called at each
    /// refresh cycle boundary, so no cached entry outlives one poll
    /// interval. Watched subreddits survive; the cycle re-fetches them
    /// right after.
    pub fn evict_on_demand(&self, watched: &[String]) {
        self.subreddits.retain(|name, _| watched.iter().any(|w| w == name));
        self.events.clear();
    }

    // --- refresh marker ---

    /// Record the display stamp of the freshest payload seen. Last writer
    /// wins across domains, matching how each page reported its own
    /// lastUpdated. Subscribers are only woken when the stamp changes.
    pub fn mark_refreshed(&self, stamp: &str) {
        self.refresh_tx.send_if_modified(|current| {
            if current.as_deref() == Some(stamp) {
                false
            } else {
                *current = Some(stamp.to_string());
                true
            }
        });
    }

    pub fn last_refreshed(&self) -> Option<String> {
        self.refresh_tx.borrow().clone()
    }

    pub fn subscribe_refresh(&self) -> watch::Receiver<Option<String>> {
        self.refresh_tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
