//! Nearest-timestamp selection for hourly forecast arrays.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// JST: the timezone the forecast APIs are queried in, used for timestamps
/// that arrive without an offset.
fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("valid JST offset")
}

/// Parse a forecast timestamp.
///
/// Accepts RFC 3339, minute-precision UTC (`2024-01-01T00:00Z`), and the
/// offset-less local forms Open-Meteo returns when a timezone is requested
/// (`2024-01-01T00:00`, with or without seconds), read as JST.
pub(crate) fn parse_forecast_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%MZ") {
        return Some(naive.and_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return naive
                .and_local_timezone(jst())
                .single()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }
    None
}

/// Index of the timestamp nearest `target` by absolute difference.
///
/// Ties resolve to the lowest index (strict `<` keeps the first best).
/// Unparseable entries are skipped; returns `None` when nothing parses.
pub(crate) fn nearest_index(times: &[String], target: DateTime<Utc>) -> Option<usize> {
    let mut best: Option<(usize, chrono::Duration)> = None;
    for (index, raw) in times.iter().enumerate() {
        let Some(time) = parse_forecast_time(raw) else {
            continue;
        };
        let diff = (time - target).abs();
        if best.is_none_or(|(_, best_diff)| diff < best_diff) {
            best = Some((index, diff));
        }
    }
    best.map(|(index, _)| index)
}
