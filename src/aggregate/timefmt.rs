use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Shape match where '#' stands for any ASCII digit and every other byte
/// must match literally.
fn matches_shape(value: &str, shape: &str) -> bool {
    value.len() == shape.len()
        && value
            .bytes()
            .zip(shape.bytes())
            .all(|(v, s)| if s == b'#' { v.is_ascii_digit() } else { v == s })
}

/// The backend emits hour buckets as bare "YYYY-MM-DDTHH" (and occasionally
/// "YYYY-MM-DDTHH:MM") strings. Pad them into full UTC instants before
/// parsing; anything else passes through untouched.
fn normalize_iso(value: &str) -> String {
    if matches_shape(value, "####-##-##T##") {
        return format!("{value}:00:00Z");
    }
    if matches_shape(value, "####-##-##T##:##") {
        return format!("{value}:00Z");
    }
    value.to_string()
}

/// Parse a backend timestamp into a UTC instant. Zoneless datetimes are
/// interpreted as UTC, which is what the ingestion pipeline writes.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let normalized = normalize_iso(value);
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// UTC "HH:MM" bucket key. Unparseable input comes back verbatim so one bad
/// record degrades to its own bucket instead of failing the batch. Keys are
/// fixed-width zero-padded, so lexical order is chronological order.
pub fn bucket_key(timestamp: &str) -> String {
    match parse_timestamp(timestamp) {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => timestamp.to_string(),
    }
}

/// Short viewer-local time for axis labels. Unparseable input passes through.
pub fn format_bucket_timestamp(value: &str) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt.with_timezone(&Local).format("%H:%M").to_string(),
        None => value.to_string(),
    }
}

/// Medium date plus short time in viewer-local zone, for "last updated"
/// stamps. Unparseable input passes through.
pub fn format_full_timestamp(value: &str) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt.with_timezone(&Local).format("%b %-d, %Y %H:%M").to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hour_is_padded_to_utc_midnight_of_that_hour() {
        assert_eq!(bucket_key("2026-02-01T07"), "07:00");
    }

    #[test]
    fn bare_minute_is_padded() {
        assert_eq!(bucket_key("2026-02-01T07:30"), "07:30");
    }

    #[test]
    fn full_iso_truncates_to_hour_minute() {
        assert_eq!(bucket_key("2026-02-01T07:05:42Z"), "07:05");
    }

    #[test]
    fn offset_timestamps_convert_to_utc_before_bucketing() {
        assert_eq!(bucket_key("2026-02-01T09:30:00+02:30"), "07:00");
    }

    #[test]
    fn zoneless_datetime_is_read_as_utc() {
        assert_eq!(bucket_key("2026-02-01T23:59:01"), "23:59");
    }

    #[test]
    fn fractional_seconds_are_accepted() {
        assert_eq!(bucket_key("2026-02-01T07:05:42.123Z"), "07:05");
    }

    #[test]
    fn date_only_buckets_to_midnight() {
        assert_eq!(bucket_key("2026-02-01"), "00:00");
    }

    #[test]
    fn garbage_passes_through_verbatim() {
        assert_eq!(bucket_key("not-a-date"), "not-a-date");
        assert_eq!(bucket_key(""), "");
        assert_eq!(format_bucket_timestamp("Just now"), "Just now");
        assert_eq!(format_full_timestamp("???"), "???");
    }

    #[test]
    fn near_miss_shapes_are_not_padded() {
        // Wrong widths and non-digits must not match the bare-bucket shapes.
        assert!(parse_timestamp("2026-2-01T07").is_none());
        assert!(parse_timestamp("2026-02-01TAB").is_none());
        assert!(parse_timestamp("2026-02-01T07:3").is_none());
    }

    #[test]
    fn local_bucket_label_has_clock_shape() {
        // Exact value depends on the host timezone, so assert shape only.
        let label = format_bucket_timestamp("2026-02-01T07:00:00Z");
        assert_eq!(label.len(), 5);
        assert_eq!(&label[2..3], ":");
    }

    #[test]
    fn full_label_never_leaks_raw_iso() {
        let label = format_full_timestamp("2026-02-01T07:00:00Z");
        assert!(!label.contains('T'));
        assert!(label.contains("2026"));
    }
}
