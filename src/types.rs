use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw analytics records (backend wire format)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrendRecord {
    pub timestamp: String,
    pub keyword: String,
    /// Velocity magnitude as computed upstream. Treated as an opaque
    /// display value here, never rescaled.
    pub velocity: f64,
    pub spike: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSentimentRecord {
    pub timestamp: String,
    pub label: String,
    /// Compound sentiment score in [-1.0, 1.0].
    pub sentiment: f64,
}

// ---------------------------------------------------------------------------
// Sentiment classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

impl SentimentClass {
    pub fn from_score(score: f64) -> Self {
        use crate::config::sentiment_thresholds::*;
        if score > POSITIVE_MIN {
            SentimentClass::Positive
        } else if score < NEGATIVE_MAX {
            SentimentClass::Negative
        } else {
            SentimentClass::Neutral
        }
    }
}

impl std::fmt::Display for SentimentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SentimentClass::Positive => "Positive",
            SentimentClass::Neutral => "Neutral",
            SentimentClass::Negative => "Negative",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Display leaves: chart and card shapes shared by every page payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Bucket label ("HH:MM") or, for unparseable source timestamps, the
    /// raw input carried through verbatim.
    pub time: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSeries {
    pub keyword: String,
    pub data: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSlice {
    pub label: String,
    /// Percentage 0..=100, rounded independently per slice.
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendTopic {
    pub keyword: String,
    /// Signed integer percentage, e.g. "+42%".
    pub velocity: String,
    pub context: Option<String>,
    pub sentiment: Option<String>,
    /// e.g. "Spike x2.4".
    pub spike: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiTile {
    pub label: String,
    pub value: String,
    pub delta: String,
    pub trend: TrendDirection,
}

/// KPI tile without a direction arrow (subreddit pages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubredditKpi {
    pub label: String,
    pub value: String,
    pub delta: String,
}

// ---------------------------------------------------------------------------
// Page payloads: camelCase on the wire, as the dashboard consumes them
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendData {
    pub last_updated: String,
    pub keyword_series: Vec<KeywordSeries>,
    pub trend_cards: Vec<TrendTopic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentData {
    pub last_updated: String,
    pub distribution: Vec<DistributionSlice>,
    pub timeline: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub last_updated: String,
    pub kpis: Vec<KpiTile>,
    pub sentiment_trend: Vec<TimeSeriesPoint>,
    pub volume_trend: Vec<TimeSeriesPoint>,
    pub trending_topics: Vec<TrendTopic>,
    pub active_subreddits: Vec<String>,
    pub active_events: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubredditData {
    pub last_updated: String,
    pub kpis: Vec<SubredditKpi>,
    pub sentiment_trend: Vec<TimeSeriesPoint>,
    pub topics: Vec<TrendTopic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub last_updated: String,
    pub volume_trend: Vec<TimeSeriesPoint>,
    pub sentiment_trend: Vec<TimeSeriesPoint>,
    pub topic_cards: Vec<TrendTopic>,
    pub top_posts: Vec<EventTopPost>,
    pub leading_subreddits: Vec<EventLeadingSubreddit>,
    pub lifecycle: Option<EventLifecycle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergingTopicData {
    pub last_updated: String,
    pub topics: Vec<EmergingTopic>,
}

// ---------------------------------------------------------------------------
// Event / emerging-topic leaves: snake_case, straight off the backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergingTopic {
    pub topic: String,
    pub raw_mentions: u64,
    pub unique_posts: u64,
    pub velocity: f64,
    pub first_seen: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTopPost {
    pub id: String,
    pub timestamp: String,
    pub title: String,
    pub subreddit: String,
    pub score: i64,
    pub comment_count: u64,
    /// Relevance weight assigned by the event matcher upstream.
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLeadingSubreddit {
    pub subreddit: String,
    pub weight: f64,
    pub posts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecyclePhase {
    Rise,
    Peak,
    Decay,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLifecycle {
    pub phase: LifecyclePhase,
    pub weighted_velocity: f64,
    pub weighted_mentions: f64,
    pub previous_weighted_mentions: f64,
    pub window_start: String,
    pub window_end: String,
    pub percentile_75: f64,
}

// ---------------------------------------------------------------------------
// Operational state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingState {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub last_run: Option<String>,
    pub next_run: Option<String>,
}

impl PollingState {
    /// Fallback body served when the backend cannot be reached.
    pub fn degraded() -> Self {
        Self {
            enabled: false,
            interval_seconds: crate::config::POLL_INTERVAL_SECS,
            last_run: None,
            next_run: None,
        }
    }
}

/// Subreddits and events currently known to the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveLists {
    pub subreddits: Vec<String>,
    pub events: Vec<String>,
}
