use tokio::sync::broadcast;

use crate::config::BUS_CAPACITY;
use crate::types::PollingState;

/// Which page snapshot a refresh just replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Dashboard,
    Trends,
    Sentiment,
    Emerging,
    Subreddits,
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SnapshotKind::Dashboard => "dashboard",
            SnapshotKind::Trends => "trends",
            SnapshotKind::Sentiment => "sentiment",
            SnapshotKind::Emerging => "emerging",
            SnapshotKind::Subreddits => "subreddits",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub enum BusEvent {
    /// A snapshot landed in the store.
    SnapshotUpdated(SnapshotKind),
    /// Backend ingestion/polling state changed.
    IngestionState(PollingState),
    /// Request an immediate out-of-band refresh cycle.
    PollNow,
}

/// In-process notification bus. Broadcast semantics: publishing with no
/// subscribers succeeds, and a lagging subscriber misses events instead of
/// blocking the publisher. The snapshot store stays the source of truth;
/// the bus only signals that it changed.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: BusEvent) {
        // send() errs only when no receiver exists, which is fine here.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
