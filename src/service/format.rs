use chrono::{DateTime, SecondsFormat, Utc};

use crate::source::types::ResultTime;

/// Format seconds as `M:SS.mmm` (e.g. `1:32.608`).
pub fn format_lap_time(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as i64;
    let minutes = total_ms / 60_000;
    let rem_ms = total_ms % 60_000;
    format!("{}:{:02}.{:03}", minutes, rem_ms / 1000, rem_ms % 1000)
}

/// Optional variant of [`format_lap_time`]; missing or non-finite values stay `None`.
pub fn format_opt(seconds: Option<f64>) -> Option<String> {
    seconds.filter(|s| s.is_finite()).map(format_lap_time)
}

pub fn format_result_time(time: &ResultTime) -> String {
    match time {
        ResultTime::Elapsed(secs) => format_lap_time(*secs),
        ResultTime::Behind(secs) => format!("+{:.3}", secs),
        ResultTime::Text(text) => text.clone(),
    }
}

pub fn format_timestamp(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn team_color(hex: Option<&str>) -> String {
    format!("#{}", hex.unwrap_or("000000").trim_start_matches('#'))
}
