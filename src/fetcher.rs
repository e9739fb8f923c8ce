use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::aggregate::sentiment::build_sentiment_data;
use crate::aggregate::timefmt::{format_bucket_timestamp, format_full_timestamp};
use crate::aggregate::trends::build_trend_data;
use crate::config::{Config, REQUEST_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::types::{
    ActiveLists, DashboardData, EmergingTopicData, EventData, PollingState, RawSentimentRecord,
    RawTrendRecord, SentimentData, SubredditData, TimeSeriesPoint, TrendData,
};

/// HTTP client for the analytics backend. Raw record endpoints are run
/// through the aggregation core; prebuilt page payloads are re-labeled for
/// the viewer's timezone before they leave this module.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    window_hours: u32,
}

impl BackendClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.backend_base_url.clone(),
            window_hours: cfg.window_hours,
        })
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url}");
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(AppError::BackendStatus {
                endpoint: path.to_string(),
                status: resp.status(),
            });
        }
        Ok(resp.json().await?)
    }

    async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(serde_json::from_value(self.get_json(path).await?)?)
    }

    /// Decode an endpoint whose body must be a JSON array. Anything else is
    /// a precondition failure, not a partial decode.
    async fn get_array<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let value = self.get_json(path).await?;
        if !value.is_array() {
            return Err(AppError::Precondition(format!(
                "{path} response was not an array"
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub async fn fetch_trend_data(&self) -> Result<TrendData> {
        let records: Vec<RawTrendRecord> = self
            .get_array(&format!("/analytics/trends?hours={}", self.window_hours))
            .await?;
        Ok(build_trend_data(&records))
    }

    pub async fn fetch_sentiment_data(&self) -> Result<SentimentData> {
        let records: Vec<RawSentimentRecord> = self
            .get_array(&format!("/analytics/sentiment?hours={}", self.window_hours))
            .await?;
        Ok(build_sentiment_data(&records))
    }

    pub async fn fetch_dashboard_data(&self) -> Result<DashboardData> {
        let mut data: DashboardData = self
            .get_typed(&format!("/analytics/dashboard?hours={}", self.window_hours))
            .await?;
        localize_dashboard(&mut data);
        Ok(data)
    }

    pub async fn fetch_emerging_topics(&self) -> Result<EmergingTopicData> {
        let mut data: EmergingTopicData = self
            .get_typed(&format!(
                "/analytics/emerging-topics?hours={}",
                self.window_hours
            ))
            .await?;
        localize_emerging(&mut data);
        Ok(data)
    }

    pub async fn fetch_subreddit_data(&self, subreddit: &str) -> Result<SubredditData> {
        let mut data: SubredditData = self
            .get_typed(&format!(
                "/analytics/subreddits/{}?hours={}",
                urlencode(subreddit),
                self.window_hours
            ))
            .await?;
        localize_subreddit(&mut data);
        Ok(data)
    }

    pub async fn fetch_event_data(&self, event_id: &str) -> Result<EventData> {
        let mut data: EventData = self
            .get_typed(&format!(
                "/analytics/events/{}?hours={}",
                urlencode(event_id),
                self.window_hours
            ))
            .await?;
        localize_event(&mut data);
        Ok(data)
    }

    pub async fn fetch_polling_state(&self) -> Result<PollingState> {
        self.get_typed("/meta/polling").await
    }

    pub async fn set_ingestion(&self, enabled: bool) -> Result<PollingState> {
        let url = format!("{}/meta/ingestion", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "enabled": enabled }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AppError::BackendStatus {
                endpoint: "/meta/ingestion".to_string(),
                status: resp.status(),
            });
        }
        Ok(resp.json().await?)
    }

    pub async fn fetch_active_lists(&self) -> Result<ActiveLists> {
        let subreddits: Vec<String> = self.get_typed("/meta/subreddits").await?;
        let events: Vec<String> = self.get_typed("/meta/events").await?;
        Ok(ActiveLists { subreddits, events })
    }

    /// Probe the backend's own health endpoint, returning its status string.
    pub async fn fetch_health(&self) -> Result<String> {
        let value = self.get_json("/health").await?;
        Ok(value
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("ok")
            .to_string())
    }
}

/// Percent-encode a path segment. Backend subreddit and event ids are plain
/// names, so only bytes that would break a URL path need escaping.
fn urlencode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Display localization: backend payloads arrive with raw ISO stamps and
// bare hour buckets; labels must never leak those to the dashboard
// ---------------------------------------------------------------------------

fn localize_series(points: &mut [TimeSeriesPoint]) {
    for point in points {
        point.time = format_bucket_timestamp(&point.time);
    }
}

fn localize_dashboard(data: &mut DashboardData) {
    data.last_updated = format_full_timestamp(&data.last_updated);
    localize_series(&mut data.sentiment_trend);
    localize_series(&mut data.volume_trend);
}

fn localize_subreddit(data: &mut SubredditData) {
    data.last_updated = format_full_timestamp(&data.last_updated);
    localize_series(&mut data.sentiment_trend);
}

fn localize_event(data: &mut EventData) {
    data.last_updated = format_full_timestamp(&data.last_updated);
    localize_series(&mut data.volume_trend);
    localize_series(&mut data.sentiment_trend);
    for post in &mut data.top_posts {
        post.timestamp = format_full_timestamp(&post.timestamp);
    }
}

fn localize_emerging(data: &mut EmergingTopicData) {
    data.last_updated = format_full_timestamp(&data.last_updated);
    for topic in &mut data.topics {
        if let Some(first_seen) = topic.first_seen.take() {
            topic.first_seen = Some(format_full_timestamp(&first_seen));
        }
    }
}
