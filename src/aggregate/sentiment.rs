use std::collections::BTreeMap;

use crate::aggregate::timefmt::{bucket_key, format_full_timestamp, parse_timestamp};
use crate::types::{
    DistributionSlice, RawSentimentRecord, SentimentClass, SentimentData, TimeSeriesPoint,
};

/// Mean compound score per time bucket, sorted ascending by bucket key.
/// Bucket keys are zero-padded "HH:MM", so the BTreeMap's lexical order is
/// chronological order.
pub fn compute_sentiment_timeline(records: &[RawSentimentRecord]) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for rec in records {
        buckets
            .entry(bucket_key(&rec.timestamp))
            .or_default()
            .push(rec.sentiment);
    }

    buckets
        .into_iter()
        .map(|(time, values)| {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            TimeSeriesPoint { time, value: mean }
        })
        .collect()
}

/// Most recent timestamp in the batch by parsed chronology, not backend
/// order. Records whose timestamps fail to parse cannot win.
fn latest_timestamp(records: &[RawSentimentRecord]) -> Option<&str> {
    records
        .iter()
        .filter_map(|rec| parse_timestamp(&rec.timestamp).map(|dt| (dt, rec.timestamp.as_str())))
        .max_by_key(|(dt, _)| *dt)
        .map(|(_, raw)| raw)
}

/// Share of positive/neutral/negative records in the latest snapshot.
/// Restricted to records whose timestamp string equals the chronologically
/// latest one; when nothing parses the whole batch counts. Always exactly
/// three slices, in Positive/Neutral/Negative order. Slices round
/// independently, so they need not sum to 100.
pub fn compute_sentiment_distribution(records: &[RawSentimentRecord]) -> Vec<DistributionSlice> {
    let latest = latest_timestamp(records);
    let in_scope = |rec: &RawSentimentRecord| match latest {
        Some(ts) => rec.timestamp == ts,
        None => true,
    };

    let mut positive = 0usize;
    let mut neutral = 0usize;
    let mut negative = 0usize;
    for rec in records.iter().filter(|rec| in_scope(rec)) {
        match SentimentClass::from_score(rec.sentiment) {
            SentimentClass::Positive => positive += 1,
            SentimentClass::Neutral => neutral += 1,
            SentimentClass::Negative => negative += 1,
        }
    }

    let total = (positive + neutral + negative).max(1) as f64;
    let share = |count: usize| ((count as f64 / total) * 100.0).round();

    vec![
        DistributionSlice {
            label: SentimentClass::Positive.to_string(),
            value: share(positive),
        },
        DistributionSlice {
            label: SentimentClass::Neutral.to_string(),
            value: share(neutral),
        },
        DistributionSlice {
            label: SentimentClass::Negative.to_string(),
            value: share(negative),
        },
    ]
}

/// Assemble the sentiment page payload from raw score records.
pub fn build_sentiment_data(records: &[RawSentimentRecord]) -> SentimentData {
    let last_updated = latest_timestamp(records)
        .map(format_full_timestamp)
        .unwrap_or_else(|| "Just now".to_string());

    SentimentData {
        last_updated,
        distribution: compute_sentiment_distribution(records),
        timeline: compute_sentiment_timeline(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(timestamp: &str, sentiment: f64) -> RawSentimentRecord {
        RawSentimentRecord {
            timestamp: timestamp.to_string(),
            label: "r/test".to_string(),
            sentiment,
        }
    }

    #[test]
    fn timeline_averages_each_bucket() {
        let records = vec![
            rec("2026-02-01T07:00:10Z", 0.4),
            rec("2026-02-01T07:00:40Z", 0.2),
            rec("2026-02-01T08:00:00Z", -0.6),
        ];
        let timeline = compute_sentiment_timeline(&records);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].time, "07:00");
        assert!((timeline[0].value - 0.3).abs() < 1e-9);
        assert_eq!(timeline[1].time, "08:00");
        assert!((timeline[1].value + 0.6).abs() < 1e-9);
    }

    #[test]
    fn timeline_is_sorted_even_when_input_is_not() {
        let records = vec![
            rec("2026-02-01T09:00:00Z", 0.1),
            rec("2026-02-01T07:00:00Z", 0.1),
            rec("2026-02-01T08:00:00Z", 0.1),
        ];
        let timeline = compute_sentiment_timeline(&records);
        let times: Vec<&str> = timeline.iter().map(|p| p.time.as_str()).collect();
        assert_eq!(times, vec!["07:00", "08:00", "09:00"]);
    }

    #[test]
    fn timeline_of_nothing_is_nothing() {
        assert!(compute_sentiment_timeline(&[]).is_empty());
    }

    #[test]
    fn distribution_uses_chronologically_latest_group() {
        // Older snapshot listed first; the 07:00 group must win regardless.
        let records = vec![
            rec("2026-02-01T06:00:00Z", 0.9),
            rec("2026-02-01T06:00:00Z", 0.9),
            rec("2026-02-01T06:00:00Z", 0.9),
            rec("2026-02-01T07:00:00Z", 0.5),
            rec("2026-02-01T07:00:00Z", -0.5),
        ];
        let dist = compute_sentiment_distribution(&records);
        assert_eq!(dist[0].label, "Positive");
        assert_eq!(dist[0].value, 50.0);
        assert_eq!(dist[1].label, "Neutral");
        assert_eq!(dist[1].value, 0.0);
        assert_eq!(dist[2].label, "Negative");
        assert_eq!(dist[2].value, 50.0);
    }

    #[test]
    fn distribution_excludes_records_outside_the_latest_snapshot() {
        let records = vec![
            rec("2026-02-01T07:00:00Z", 0.2),
            rec("2026-02-01T07:00:00Z", -0.5),
            rec("2026-02-01T06:00:00Z", 0.9),
        ];
        let dist = compute_sentiment_distribution(&records);
        assert_eq!(dist[0].value, 50.0);
        assert_eq!(dist[1].value, 0.0);
        assert_eq!(dist[2].value, 50.0);
    }

    #[test]
    fn distribution_boundary_scores_are_neutral() {
        let records = vec![
            rec("2026-02-01T07:00:00Z", 0.1),
            rec("2026-02-01T07:00:00Z", -0.1),
            rec("2026-02-01T07:00:00Z", 0.11),
            rec("2026-02-01T07:00:00Z", -0.11),
        ];
        let dist = compute_sentiment_distribution(&records);
        assert_eq!(dist[0].value, 25.0);
        assert_eq!(dist[1].value, 50.0);
        assert_eq!(dist[2].value, 25.0);
    }

    #[test]
    fn distribution_of_empty_input_is_all_zero() {
        let dist = compute_sentiment_distribution(&[]);
        assert_eq!(dist.len(), 3);
        assert!(dist.iter().all(|slice| slice.value == 0.0));
        let labels: Vec<&str> = dist.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Positive", "Neutral", "Negative"]);
    }

    #[test]
    fn unparseable_timestamps_fall_back_to_whole_batch() {
        let records = vec![rec("???", 0.9), rec("???", -0.9)];
        let dist = compute_sentiment_distribution(&records);
        assert_eq!(dist[0].value, 50.0);
        assert_eq!(dist[2].value, 50.0);
    }

    #[test]
    fn slices_round_independently() {
        let records = vec![
            rec("2026-02-01T07:00:00Z", 0.9),
            rec("2026-02-01T07:00:00Z", 0.0),
            rec("2026-02-01T07:00:00Z", -0.9),
        ];
        let dist = compute_sentiment_distribution(&records);
        assert!(dist.iter().all(|slice| slice.value == 33.0));
    }

    #[test]
    fn rebuilding_from_the_same_records_is_identical() {
        let records = vec![
            rec("2026-02-01T07:00:00Z", 0.2),
            rec("2026-02-01T06:00:00Z", -0.5),
            rec("not a timestamp", 0.9),
        ];
        let first = serde_json::to_value(build_sentiment_data(&records)).unwrap();
        let second = serde_json::to_value(build_sentiment_data(&records)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sentiment_data_last_updated_tracks_latest_record() {
        let records = vec![
            rec("2026-02-01T07:00:00Z", 0.2),
            rec("2026-02-01T06:00:00Z", 0.2),
        ];
        let data = build_sentiment_data(&records);
        assert!(!data.last_updated.contains('T'));
        assert!(data.last_updated.contains("2026"));

        let empty = build_sentiment_data(&[]);
        assert_eq!(empty.last_updated, "Just now");
    }
}
