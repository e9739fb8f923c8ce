use std::collections::HashMap;

use crate::aggregate::timefmt::{bucket_key, format_full_timestamp};
use crate::config::TREND_CARD_LIMIT;
use crate::types::{KeywordSeries, RawTrendRecord, TimeSeriesPoint, TrendData, TrendTopic};

/// Group velocity records into one series per keyword. Series appear in
/// order of first keyword appearance and points keep backend order within
/// each series. Points landing in the same bucket stay distinct; collapsing
/// them would change what gets plotted.
pub fn group_trends_by_keyword(records: &[RawTrendRecord]) -> Vec<KeywordSeries> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<TimeSeriesPoint>> = HashMap::new();

    for rec in records {
        let series = grouped.entry(rec.keyword.clone()).or_insert_with(|| {
            order.push(rec.keyword.clone());
            Vec::new()
        });
        series.push(TimeSeriesPoint {
            time: bucket_key(&rec.timestamp),
            value: rec.velocity,
        });
    }

    order
        .into_iter()
        .map(|keyword| {
            let data = grouped.remove(&keyword).unwrap_or_default();
            KeywordSeries { keyword, data }
        })
        .collect()
}

/// Velocity rendered as a signed integer percentage. Rounding to the
/// integer first keeps "-0.3" from printing as "+-0%".
fn velocity_label(velocity: f64) -> String {
    let n = velocity.round() as i64;
    if n >= 0 {
        format!("+{n}%")
    } else {
        format!("{n}%")
    }
}

fn spike_label(spike: f64) -> String {
    format!("Spike x{spike:.1}")
}

/// Headline cards for the first `limit` records in backend order. The
/// backend already ranks its trend output, so no re-sorting happens here.
pub fn build_top_trend_cards(records: &[RawTrendRecord], limit: usize) -> Vec<TrendTopic> {
    records
        .iter()
        .take(limit)
        .map(|rec| TrendTopic {
            keyword: rec.keyword.clone(),
            velocity: velocity_label(rec.velocity),
            context: Some("Global".to_string()),
            sentiment: Some("Neutral".to_string()),
            spike: Some(spike_label(rec.spike)),
        })
        .collect()
}

/// Assemble the trends page payload from raw velocity records.
pub fn build_trend_data(records: &[RawTrendRecord]) -> TrendData {
    let last_updated = records
        .first()
        .map(|rec| format_full_timestamp(&rec.timestamp))
        .unwrap_or_else(|| "Just now".to_string());

    TrendData {
        last_updated,
        keyword_series: group_trends_by_keyword(records),
        trend_cards: build_top_trend_cards(records, TREND_CARD_LIMIT),
    }
}
