mod aggregate;
mod bus;
mod config;
mod error;
mod fetcher;
mod poller;
mod state;
mod types;
mod api;

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::bus::{BusEvent, EventBus};
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::BackendClient;
use crate::poller::{PollingWatcher, SnapshotPoller};
use crate::state::SnapshotStore;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let client = BackendClient::new(&cfg)?;
    let store = SnapshotStore::new();
    let bus = EventBus::new();
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());

    // --- Watch list notice ---
    if cfg.watch_subreddits.is_empty() {
        warn!("WATCH_SUBREDDITS not set; subreddit pages will only be fetched on demand. Example: WATCH_SUBREDDITS=wallstreetbets,stocks,cryptocurrency");
    } else {
        info!(
            "Watched subreddits configured ({}): refreshed every cycle.",
            cfg.watch_subreddits.join(", "),
        );
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // --- Bootstrap: one full refresh cycle before anything is served ---
    let poller = SnapshotPoller::new(
        cfg.clone(),
        client.clone(),
        Arc::clone(&store),
        bus.clone(),
        Arc::clone(&health),
        Arc::clone(&latency),
        shutdown_rx.clone(),
    );
    poller.cycle().await;
    info!(
        "Bootstrap complete: backend {} at {}, {} watched subreddits cached",
        if health.backend_reachable() { "reachable" } else { "unreachable" },
        cfg.backend_base_url,
        store.cached_subreddit_count(),
    );

    // --- Spawn tasks ---

    // Snapshot poller (background, every 300s)
    tokio::spawn(poller.run());

    // Polling state watcher (background, every 30s)
    let watcher = PollingWatcher::new(
        &cfg,
        client.clone(),
        Arc::clone(&store),
        bus.clone(),
        shutdown_rx,
    );
    tokio::spawn(watcher.run());

    // Bus event consumer: operational log mirror of the status widgets
    let bus_rx = bus.subscribe();
    tokio::spawn(async move { bus_logger(bus_rx).await });

    // Refresh marker consumer: logs the stamp whenever fresher data lands
    let refresh_rx = store.subscribe_refresh();
    tokio::spawn(async move { refresh_logger(refresh_rx).await });

    // HTTP API server
    let api_state = ApiState { store, client, bus, health, latency };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    Ok(())
}

/// Consumes bus events and logs them, the way the dashboard's status
/// widgets surfaced them to the viewer.
async fn bus_logger(mut rx: broadcast::Receiver<BusEvent>) {
    loop {
        match rx.recv().await {
            Ok(BusEvent::SnapshotUpdated(kind)) => debug!("Snapshot updated: {kind}"),
            Ok(BusEvent::IngestionState(state)) => {
                let label = if state.enabled { "enabled" } else { "disabled" };
                info!(enabled = state.enabled, "Backend ingestion is now {label}");
            }
            Ok(BusEvent::PollNow) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Logs the display stamp each time the refresh marker advances.
async fn refresh_logger(mut rx: watch::Receiver<Option<String>>) {
    while rx.changed().await.is_ok() {
        let stamp = rx.borrow_and_update().clone();
        if let Some(stamp) = stamp {
            info!("Data refreshed, last update {stamp}");
        }
    }
}

/// Resolves on ctrl-c and flips the shutdown flag the background tasks watch.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {e}");
        return;
    }
    info!("Shutdown signal received, stopping background tasks");
    let _ = shutdown_tx.send(true);
}
