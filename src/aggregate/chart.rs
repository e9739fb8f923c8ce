use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{AXIS_MIN_PAD, AXIS_PAD_RATIO};
use crate::types::KeywordSeries;

/// One chart row: the bucket label plus one column per keyword that has a
/// value in that bucket. Missing combinations stay absent so the renderer
/// draws a gap, never a fabricated zero.
#[derive(Debug, Clone, Serialize)]
pub struct ChartRow {
    pub time: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergedChart {
    pub rows: Vec<ChartRow>,
    /// Padded [min, max] for the value axis.
    pub domain: [f64; 2],
}

/// Merge per-keyword series into row-per-bucket chart input. Rows come out
/// sorted by bucket key (zero-padded keys make lexical order chronological).
/// The axis domain spans all finite input values, padded on both ends by
/// the larger of AXIS_MIN_PAD and AXIS_PAD_RATIO of the span; with no
/// finite values it collapses to [0, 0] unpadded.
pub fn merge_series_for_chart(series: &[KeywordSeries]) -> MergedChart {
    let mut cells: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for ks in series {
        for point in &ks.data {
            cells
                .entry(point.time.clone())
                .or_default()
                .insert(ks.keyword.clone(), point.value);
            if point.value.is_finite() {
                min = min.min(point.value);
                max = max.max(point.value);
            }
        }
    }

    let domain = if min.is_finite() && max.is_finite() {
        let pad = ((max - min) * AXIS_PAD_RATIO).max(AXIS_MIN_PAD);
        [min - pad, max + pad]
    } else {
        [0.0, 0.0]
    };

    let rows = cells
        .into_iter()
        .map(|(time, values)| ChartRow { time, values })
        .collect();

    MergedChart { rows, domain }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeSeriesPoint;

    fn series(keyword: &str, points: &[(&str, f64)]) -> KeywordSeries {
        KeywordSeries {
            keyword: keyword.to_string(),
            data: points
                .iter()
                .map(|(time, value)| TimeSeriesPoint {
                    time: time.to_string(),
                    value: *value,
                })
                .collect(),
        }
    }

    #[test]
    fn shared_buckets_collapse_into_one_row() {
        let merged = merge_series_for_chart(&[
            series("gpu", &[("07:00", 10.0), ("08:00", 20.0)]),
            series("ai", &[("07:00", 5.0)]),
        ]);
        assert_eq!(merged.rows.len(), 2);
        let row = &merged.rows[0];
        assert_eq!(row.time, "07:00");
        assert_eq!(row.values.get("gpu"), Some(&10.0));
        assert_eq!(row.values.get("ai"), Some(&5.0));
    }

    #[test]
    fn missing_combinations_stay_absent() {
        let merged = merge_series_for_chart(&[
            series("gpu", &[("07:00", 1.0), ("08:00", 2.0)]),
            series("ai", &[("08:00", 3.0), ("09:00", 4.0)]),
        ]);
        assert_eq!(merged.rows.len(), 3);
        assert!(merged.rows[0].values.contains_key("gpu"));
        assert!(!merged.rows[0].values.contains_key("ai"));
        assert!(merged.rows[2].values.contains_key("ai"));
        assert!(!merged.rows[2].values.contains_key("gpu"));
    }

    #[test]
    fn rows_sort_by_bucket_even_when_series_do_not() {
        let merged = merge_series_for_chart(&[series(
            "gpu",
            &[("09:00", 1.0), ("07:00", 2.0), ("08:00", 3.0)],
        )]);
        let times: Vec<&str> = merged.rows.iter().map(|r| r.time.as_str()).collect();
        assert_eq!(times, vec!["07:00", "08:00", "09:00"]);
    }

    #[test]
    fn domain_pads_by_a_tenth_of_the_span() {
        let merged = merge_series_for_chart(&[series("gpu", &[("07:00", 10.0), ("08:00", 90.0)])]);
        assert_eq!(merged.domain, [2.0, 98.0]);
    }

    #[test]
    fn domain_pad_never_drops_below_minimum() {
        let merged = merge_series_for_chart(&[series("gpu", &[("07:00", 50.0), ("08:00", 52.0)])]);
        assert_eq!(merged.domain, [45.0, 57.0]);
    }

    #[test]
    fn single_value_gets_minimum_pad() {
        let merged = merge_series_for_chart(&[series("gpu", &[("07:00", 42.0)])]);
        assert_eq!(merged.domain, [37.0, 47.0]);
    }

    #[test]
    fn empty_input_has_unpadded_zero_domain() {
        let merged = merge_series_for_chart(&[]);
        assert!(merged.rows.is_empty());
        assert_eq!(merged.domain, [0.0, 0.0]);

        let no_points = merge_series_for_chart(&[series("gpu", &[])]);
        assert_eq!(no_points.domain, [0.0, 0.0]);
    }

    #[test]
    fn non_finite_values_do_not_poison_the_domain() {
        let merged = merge_series_for_chart(&[series(
            "gpu",
            &[("07:00", f64::NAN), ("08:00", 10.0), ("09:00", 30.0)],
        )]);
        assert_eq!(merged.domain, [5.0, 35.0]);
    }

    #[test]
    fn rows_serialize_with_keyword_columns_inline() {
        let merged = merge_series_for_chart(&[
            series("gpu", &[("07:00", 10.0)]),
            series("ai", &[("07:00", 5.0)]),
        ]);
        let json = serde_json::to_value(&merged.rows[0]).unwrap();
        assert_eq!(json["time"], "07:00");
        assert_eq!(json["gpu"], 10.0);
        assert_eq!(json["ai"], 5.0);
    }
}
