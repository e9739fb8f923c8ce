//! Shared health state for the /health endpoint.
//! Updated by the snapshot poller, read by the API.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared health metrics. The poller records each cycle, the API reads.
#[derive(Default)]
pub struct HealthState {
    /// True when the last refresh cycle got at least one response back.
    pub backend_reachable: AtomicBool,
    /// Total refresh cycles run since startup.
    pub cycles_completed: AtomicU64,
    /// Cycles in a row with at least one failed domain (0 = last was clean).
    pub consecutive_failures: AtomicU64,
    /// Millisecond timestamp of the last completed cycle (0 = none yet).
    pub last_cycle_unix_ms: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_backend_reachable(&self, v: bool) {
        self.backend_reachable.store(v, Ordering::Relaxed);
    }

    /// Record a finished refresh cycle. `clean` means no domain failed.
    pub fn record_cycle(&self, clean: bool) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        if clean {
            self.consecutive_failures.store(0, Ordering::Relaxed);
        } else {
            self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        }
        self.last_cycle_unix_ms.store(now_ms(), Ordering::Relaxed);
    }

    pub fn backend_reachable(&self) -> bool {
        self.backend_reachable.load(Ordering::Relaxed)
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn last_cycle_unix_ms(&self) -> u64 {
        self.last_cycle_unix_ms.load(Ordering::Relaxed)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_streak_resets_on_clean_cycle() {
        let health = HealthState::new();
        health.record_cycle(false);
        health.record_cycle(false);
        assert_eq!(health.consecutive_failures(), 2);
        assert_eq!(health.cycles_completed(), 2);

        health.record_cycle(true);
        assert_eq!(health.consecutive_failures(), 0);
        assert_eq!(health.cycles_completed(), 3);
        assert!(health.last_cycle_unix_ms() > 0);
    }
}
