use crate::error::{AppError, Result};

pub const BACKEND_BASE_URL: &str = "http://localhost:8000";

/// How many trend records become headline cards.
pub const TREND_CARD_LIMIT: usize = 5;

/// Full snapshot refresh interval (seconds). Matches the backend scheduler
/// cadence so a poll never lands more than one ingestion cycle behind.
pub const POLL_INTERVAL_SECS: u64 = 300;

/// Polling-state probe interval (seconds); how often /meta/polling is
/// re-read between full refreshes.
pub const POLLING_STATE_REFRESH_SECS: u64 = 30;

/// Analysis window requested from the backend, in hours (1..=168 accepted
/// server-side).
pub const WINDOW_HOURS: u32 = 24;

/// Backend request timeout (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Channel capacity for the internal event bus.
pub const BUS_CAPACITY: usize = 64;

/// Chart axis padding: at least AXIS_MIN_PAD per side, or AXIS_PAD_RATIO of
/// the value span, whichever is larger.
pub const AXIS_MIN_PAD: f64 = 5.0;
pub const AXIS_PAD_RATIO: f64 = 0.1;

/// Compound sentiment score cutoffs. Scores strictly above POSITIVE_MIN are
/// positive, strictly below NEGATIVE_MAX negative, everything else neutral.
pub mod sentiment_thresholds {
    pub const POSITIVE_MIN: f64 = 0.1;
    pub const NEGATIVE_MAX: f64 = -0.1;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_base_url: String,
    pub log_level: String,
    pub api_port: u16,
    /// Seconds between full snapshot refresh cycles (POLL_INTERVAL_SECS).
    pub poll_interval_secs: u64,
    /// Seconds between /meta/polling probes (POLLING_STATE_REFRESH_SECS).
    pub polling_state_refresh_secs: u64,
    /// Analysis window in hours passed to every analytics endpoint (WINDOW_HOURS).
    pub window_hours: u32,
    /// Subreddits to refresh eagerly each cycle (WATCH_SUBREDDITS, comma-separated).
    /// Example: "wallstreetbets,stocks,cryptocurrency"
    pub watch_subreddits: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            backend_base_url: std::env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| BACKEND_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            poll_interval_secs: std::env::var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| POLL_INTERVAL_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(POLL_INTERVAL_SECS),
            polling_state_refresh_secs: std::env::var("POLLING_STATE_REFRESH_SECS")
                .unwrap_or_else(|_| POLLING_STATE_REFRESH_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(POLLING_STATE_REFRESH_SECS),
            window_hours: std::env::var("WINDOW_HOURS")
                .unwrap_or_else(|_| WINDOW_HOURS.to_string())
                .parse::<u32>()
                .unwrap_or(WINDOW_HOURS),
            watch_subreddits: std::env::var("WATCH_SUBREDDITS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}
