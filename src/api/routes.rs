use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::chart::{merge_series_for_chart, MergedChart};
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::bus::{BusEvent, EventBus};
use crate::error::AppError;
use crate::fetcher::BackendClient;
use crate::state::SnapshotStore;
use crate::types::{
    ActiveLists, DashboardData, EmergingTopicData, EventData, PollingState, SentimentData,
    SubredditData, TrendData,
};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<SnapshotStore>,
    pub client: BackendClient,
    pub bus: EventBus,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/trends", get(get_trends))
        .route("/api/trends/chart", get(get_trends_chart))
        .route("/api/sentiment", get(get_sentiment))
        .route("/api/emerging", get(get_emerging))
        .route("/api/subreddits/:name", get(get_subreddit))
        .route("/api/events/:id", get(get_event))
        .route("/api/active-lists", get(get_active_lists))
        .route("/api/polling", get(get_polling))
        .route("/api/ingestion", post(post_ingestion))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct IngestionRequest {
    pub enabled: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: String,
    /// Display stamp of the freshest payload seen, None before first data.
    pub last_refreshed: Option<String>,
    pub cycles_completed: u64,
    pub consecutive_failures: u64,
    pub last_cycle_unix_ms: u64,
}

#[derive(Serialize)]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_dashboard(
    State(state): State<ApiState>,
) -> Result<Json<DashboardData>, AppError> {
    state
        .store
        .dashboard()
        .map(Json)
        .ok_or(AppError::SnapshotMissing("dashboard"))
}

async fn get_trends(State(state): State<ApiState>) -> Result<Json<TrendData>, AppError> {
    state
        .store
        .trends()
        .map(Json)
        .ok_or(AppError::SnapshotMissing("trends"))
}

/// The keyword series merged into one row per bucket plus a padded axis
/// domain, for renderers that want table-shaped multi-line chart input.
async fn get_trends_chart(
    State(state): State<ApiState>,
) -> Result<Json<MergedChart>, AppError> {
    let trends = state
        .store
        .trends()
        .ok_or(AppError::SnapshotMissing("trends"))?;
    Ok(Json(merge_series_for_chart(&trends.keyword_series)))
}

async fn get_sentiment(
    State(state): State<ApiState>,
) -> Result<Json<SentimentData>, AppError> {
    state
        .store
        .sentiment()
        .map(Json)
        .ok_or(AppError::SnapshotMissing("sentiment"))
}

async fn get_emerging(
    State(state): State<ApiState>,
) -> Result<Json<EmergingTopicData>, AppError> {
    state
        .store
        .emerging()
        .map(Json)
        .ok_or(AppError::SnapshotMissing("emerging topics"))
}

/// Cached payload if the poller (or a previous request) already has it,
/// otherwise fetch through and cache. On-demand entries age out at the
/// next poll cycle.
async fn get_subreddit(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<SubredditData>, AppError> {
    if let Some(cached) = state.store.subreddit(&name) {
        return Ok(Json(cached));
    }
    let data = state.client.fetch_subreddit_data(&name).await?;
    state.store.set_subreddit(&name, data.clone());
    Ok(Json(data))
}

async fn get_event(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<EventData>, AppError> {
    if let Some(cached) = state.store.event(&id) {
        return Ok(Json(cached));
    }
    let data = state.client.fetch_event_data(&id).await?;
    state.store.set_event(&id, data.clone());
    Ok(Json(data))
}

async fn get_active_lists(State(state): State<ApiState>) -> (StatusCode, Json<ActiveLists>) {
    if let Some(lists) = state.store.active_lists() {
        return (StatusCode::OK, Json(lists));
    }
    match state.client.fetch_active_lists().await {
        Ok(lists) => {
            state.store.set_active_lists(lists.clone());
            (StatusCode::OK, Json(lists))
        }
        Err(e) => {
            warn!("Active lists unavailable: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, Json(ActiveLists::default()))
        }
    }
}

/// Stored state first; the polling watcher keeps it at most 30s stale. The
/// degraded default body is only served when nothing is stored AND the
/// backend cannot be reached.
async fn get_polling(State(state): State<ApiState>) -> (StatusCode, Json<PollingState>) {
    if let Some(stored) = state.store.polling() {
        return (StatusCode::OK, Json(stored));
    }
    match state.client.fetch_polling_state().await {
        Ok(live) => {
            state.store.set_polling(live.clone());
            (StatusCode::OK, Json(live))
        }
        Err(e) => {
            warn!("Polling state unavailable: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, Json(PollingState::degraded()))
        }
    }
}

async fn post_ingestion(
    State(state): State<ApiState>,
    Json(req): Json<IngestionRequest>,
) -> Result<Json<PollingState>, AppError> {
    let new_state = state.client.set_ingestion(req.enabled).await?;
    state.store.set_polling(new_state.clone());
    info!(enabled = new_state.enabled, "Ingestion toggled via API");
    state.bus.publish(BusEvent::IngestionState(new_state.clone()));
    state.bus.publish(BusEvent::PollNow);
    Ok(Json(new_state))
}

async fn get_health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, backend) = match state.client.fetch_health().await {
        Ok(backend_status) => {
            state.health.set_backend_reachable(true);
            (StatusCode::OK, "ok", backend_status)
        }
        Err(e) => {
            warn!("Backend health probe failed: {e}");
            state.health.set_backend_reachable(false);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unreachable".to_string())
        }
    };
    let body = HealthResponse {
        status,
        backend,
        last_refreshed: state.store.last_refreshed(),
        cycles_completed: state.health.cycles_completed(),
        consecutive_failures: state.health.consecutive_failures(),
        last_cycle_unix_ms: state.health.last_cycle_unix_ms(),
    };
    (code, Json(body))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let (p50, p95, p99) = state.latency.percentiles();
    let to_ms = |us: Option<u64>| us.map(|v| v as f64 / 1000.0);
    Json(LatencyResponse {
        samples: state.latency.len(),
        p50_ms: to_ms(p50),
        p95_ms: to_ms(p95),
        p99_ms: to_ms(p99),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_state() -> ApiState {
        let cfg = Config {
            // Nothing listens on port 9; backend calls fail fast.
            backend_base_url: "http://127.0.0.1:9".to_string(),
            log_level: "info".to_string(),
            api_port: 0,
            poll_interval_secs: 3600,
            polling_state_refresh_secs: 3600,
            window_hours: 24,
            watch_subreddits: vec![],
        };
        ApiState {
            store: SnapshotStore::new(),
            client: BackendClient::new(&cfg).unwrap(),
            bus: EventBus::new(),
            health: Arc::new(HealthState::new()),
            latency: Arc::new(LatencyStats::new()),
        }
    }

    #[tokio::test]
    async fn snapshot_endpoints_require_a_landed_snapshot() {
        let state = test_state();

        let missing = get_trends(State(state.clone())).await;
        assert!(matches!(missing, Err(AppError::SnapshotMissing("trends"))));

        state.store.set_trends(TrendData {
            last_updated: "Just now".to_string(),
            keyword_series: vec![],
            trend_cards: vec![],
        });
        let Json(body) = get_trends(State(state)).await.unwrap();
        assert_eq!(body.last_updated, "Just now");
    }

    #[tokio::test]
    async fn trends_chart_merges_the_stored_series() {
        use crate::types::{KeywordSeries, TimeSeriesPoint};

        let state = test_state();
        state.store.set_trends(TrendData {
            last_updated: "Just now".to_string(),
            keyword_series: vec![
                KeywordSeries {
                    keyword: "gpu".to_string(),
                    data: vec![TimeSeriesPoint { time: "07:00".to_string(), value: 10.0 }],
                },
                KeywordSeries {
                    keyword: "ai".to_string(),
                    data: vec![TimeSeriesPoint { time: "08:00".to_string(), value: 30.0 }],
                },
            ],
            trend_cards: vec![],
        });

        let Json(chart) = get_trends_chart(State(state)).await.unwrap();
        assert_eq!(chart.rows.len(), 2);
        assert_eq!(chart.domain, [5.0, 35.0]);
    }

    #[tokio::test]
    async fn polling_serves_degraded_body_when_backend_is_down() {
        let state = test_state();
        let (code, Json(body)) = get_polling(State(state)).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, PollingState::degraded());
    }

    #[tokio::test]
    async fn polling_prefers_the_stored_state() {
        let state = test_state();
        let stored = PollingState {
            enabled: true,
            interval_seconds: 120,
            last_run: Some("2026-02-03T04:05:06Z".to_string()),
            next_run: None,
        };
        state.store.set_polling(stored.clone());

        let (code, Json(body)) = get_polling(State(state)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, stored);
    }

    #[tokio::test]
    async fn health_reports_unreachable_backend() {
        let state = test_state();
        let (code, Json(body)) = get_health(State(state)).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.backend, "unreachable");
        assert!(body.last_refreshed.is_none());
    }
}
