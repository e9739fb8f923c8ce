use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, watch};
use tokio::time::interval;
use tracing::{info, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::bus::{BusEvent, EventBus, SnapshotKind};
use crate::config::Config;
use crate::fetcher::BackendClient;
use crate::state::SnapshotStore;

/// Background refresher for the page snapshots. Each cycle ages out keyed
/// payloads cached on demand, then fetches every page payload plus the
/// watched subreddits; one failing domain never blocks the others, and
/// there are no intra-cycle retries.
pub struct SnapshotPoller {
    cfg: Config,
    client: BackendClient,
    store: Arc<SnapshotStore>,
    bus: EventBus,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SnapshotPoller {
    pub fn new(
        cfg: Config,
        client: BackendClient,
        store: Arc<SnapshotStore>,
        bus: EventBus,
        health: Arc<HealthState>,
        latency: Arc<LatencyStats>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self { cfg, client, store, bus, health, latency, shutdown_rx }
    }

    pub async fn run(mut self) {
        let mut bus_rx = self.bus.subscribe();
        let mut ticker = interval(Duration::from_secs(self.cfg.poll_interval_secs));
        ticker.tick().await; // skip immediate first tick, bootstrap cycle already ran

        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Snapshot poller stopping");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.cycle().await;
                }
                event = bus_rx.recv() => match event {
                    Ok(BusEvent::PollNow) => {
                        info!("Out-of-band refresh requested");
                        self.cycle().await;
                    }
                    Ok(BusEvent::IngestionState(state)) => {
                        // Backend ingestion toggled; its lastRun becomes the
                        // freshest stamp we know about.
                        if let Some(last_run) = state.last_run {
                            self.store.mark_refreshed(&last_run);
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Poller bus receiver lagged, skipped {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }

    /// One full refresh pass. Called directly once at startup (bootstrap),
    /// then from the tick loop.
    pub(crate) async fn cycle(&self) {
        let started = Instant::now();
        let mut ok = 0usize;
        let mut failed = 0usize;

        // On-demand keyed payloads from the previous interval age out here;
        // watched subreddits are re-fetched below.
        self.store.evict_on_demand(&self.cfg.watch_subreddits);

        match self.client.fetch_dashboard_data().await {
            Ok(data) => {
                let stamp = data.last_updated.clone();
                self.store.set_dashboard(data);
                self.store.mark_refreshed(&stamp);
                self.bus.publish(BusEvent::SnapshotUpdated(SnapshotKind::Dashboard));
                ok += 1;
            }
            Err(e) => {
                warn!("Dashboard refresh failed: {e}");
                failed += 1;
            }
        }

        match self.client.fetch_trend_data().await {
            Ok(data) => {
                let stamp = data.last_updated.clone();
                self.store.set_trends(data);
                self.store.mark_refreshed(&stamp);
                self.bus.publish(BusEvent::SnapshotUpdated(SnapshotKind::Trends));
                ok += 1;
            }
            Err(e) => {
                warn!("Trends refresh failed: {e}");
                failed += 1;
            }
        }

        match self.client.fetch_sentiment_data().await {
            Ok(data) => {
                let stamp = data.last_updated.clone();
                self.store.set_sentiment(data);
                self.store.mark_refreshed(&stamp);
                self.bus.publish(BusEvent::SnapshotUpdated(SnapshotKind::Sentiment));
                ok += 1;
            }
            Err(e) => {
                warn!("Sentiment refresh failed: {e}");
                failed += 1;
            }
        }

        match self.client.fetch_emerging_topics().await {
            Ok(data) => {
                let stamp = data.last_updated.clone();
                self.store.set_emerging(data);
                self.store.mark_refreshed(&stamp);
                self.bus.publish(BusEvent::SnapshotUpdated(SnapshotKind::Emerging));
                ok += 1;
            }
            Err(e) => {
                warn!("Emerging topics refresh failed: {e}");
                failed += 1;
            }
        }

        let mut subs_ok = 0usize;
        for name in &self.cfg.watch_subreddits {
            match self.client.fetch_subreddit_data(name).await {
                Ok(data) => {
                    self.store.set_subreddit(name, data);
                    subs_ok += 1;
                }
                Err(e) => {
                    warn!(subreddit = %name, "Subreddit refresh failed: {e}");
                    failed += 1;
                }
            }
        }
        if subs_ok > 0 {
            self.bus.publish(BusEvent::SnapshotUpdated(SnapshotKind::Subreddits));
        }
        ok += subs_ok;

        match self.client.fetch_active_lists().await {
            Ok(lists) => {
                self.store.set_active_lists(lists);
                ok += 1;
            }
            Err(e) => {
                warn!("Active lists refresh failed: {e}");
                failed += 1;
            }
        }

        self.health.set_backend_reachable(ok > 0);
        self.health.record_cycle(failed == 0);
        let elapsed = started.elapsed();
        self.latency.record(elapsed);

        info!(
            ok = ok,
            failed = failed,
            cached_subreddits = self.store.cached_subreddit_count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Refresh cycle complete: {ok} ok, {failed} failed",
        );
    }
}

// ---------------------------------------------------------------------------
// PollingWatcher
// ---------------------------------------------------------------------------

/// Tracks the backend's ingestion/polling state between full refreshes:
///
/// - Probes /meta/polling every `polling_state_refresh_secs` (first probe
///   immediately on startup).
/// - Stores the result and publishes `IngestionState` only when it actually
///   changed, so subscribers never see repeat states.
/// - A failed probe leaves the last known state in place; /api/polling keeps
///   serving it until the backend comes back.
pub struct PollingWatcher {
    client: BackendClient,
    store: Arc<SnapshotStore>,
    bus: EventBus,
    refresh_secs: u64,
    shutdown_rx: watch::Receiver<bool>,
}

impl PollingWatcher {
    pub fn new(
        cfg: &Config,
        client: BackendClient,
        store: Arc<SnapshotStore>,
        bus: EventBus,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            store,
            bus,
            refresh_secs: cfg.polling_state_refresh_secs,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) {
        let mut ticker = interval(Duration::from_secs(self.refresh_secs));

        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Polling watcher stopping");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.probe().await {
                        warn!("Polling state probe failed: {e}");
                    }
                }
            }
        }
    }

    async fn probe(&self) -> crate::error::Result<()> {
        let state = self.client.fetch_polling_state().await?;
        if self.store.set_polling(state.clone()) {
            info!(
                enabled = state.enabled,
                interval_seconds = state.interval_seconds,
                "Ingestion polling state changed",
            );
            self.bus.publish(BusEvent::IngestionState(state));
        }
        Ok(())
    }
}
