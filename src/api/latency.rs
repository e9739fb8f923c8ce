//! In-memory latency histogram for refresh instrumentation.
//! Records wall time of each full snapshot refresh cycle.

use std::sync::Mutex;
use std::time::Duration;

/// Shared latency stats. Poller records, API reads.
/// Values stored in microseconds.
pub struct LatencyStats {
    inner: Mutex<hdrhistogram::Histogram<u64>>,
}

impl LatencyStats {
    /// Create a new histogram. Tracks 1us to 600s, 3 significant figures.
    /// The upper bound covers a cycle where every backend request times out.
    pub fn new() -> Self {
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 600_000_000, 3)
            .expect("valid histogram bounds");
        Self {
            inner: Mutex::new(histogram),
        }
    }

    /// Record a cycle duration in microseconds.
    pub fn record_us(&self, us: u64) {
        if let Ok(mut h) = self.inner.lock() {
            let _ = h.record(us);
        }
    }

    /// Record from a std::time::Duration.
    pub fn record(&self, d: Duration) {
        let us = d.as_micros().min(u128::from(u64::MAX)) as u64;
        self.record_us(us);
    }

    /// Return (p50_us, p95_us, p99_us). None if no samples.
    pub fn percentiles(&self) -> (Option<u64>, Option<u64>, Option<u64>) {
        let Ok(h) = self.inner.lock() else {
            return (None, None, None);
        };
        if h.len() == 0 {
            return (None, None, None);
        }
        let p50 = h.value_at_quantile(0.5);
        let p95 = h.value_at_quantile(0.95);
        let p99 = h.value_at_quantile(0.99);
        (Some(p50), Some(p95), Some(p99))
    }

    /// Sample count.
    pub fn len(&self) -> u64 {
        self.inner.lock().map(|h| h.len()).unwrap_or(0)
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_track_recorded_cycles() {
        let stats = LatencyStats::new();
        assert_eq!(stats.percentiles(), (None, None, None));

        for ms in [10u64, 20, 30, 40, 50] {
            stats.record(Duration::from_millis(ms));
        }

        assert_eq!(stats.len(), 5);
        let (p50, p95, p99) = stats.percentiles();
        let p50 = p50.unwrap();
        let p99 = p99.unwrap();
        // 3 significant figures, so allow the histogram's bucketing error.
        assert!((29_000..=31_000).contains(&p50), "p50 was {p50}");
        assert!((49_000..=51_000).contains(&p99), "p99 was {p99}");
        assert!(p95.unwrap() <= p99);
    }
}
