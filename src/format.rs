use chrono::{DateTime, FixedOffset};
use serde::Serialize;

const MISSING: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Number,
    Percent,
    Duration,
}

pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.1}%"),
        None => MISSING.to_string(),
    }
}

/// Sub-second latencies render in whole milliseconds, everything else in seconds.
pub fn format_duration(value: Option<f64>) -> String {
    match value {
        Some(value) if value < 1000.0 => format!("{}ms", value.round() as i64),
        Some(value) => format!("{:.2}s", value / 1000.0),
        None => MISSING.to_string(),
    }
}

/// zh-CN style grouping: `1234567.891` renders as `1,234,567.891`, at most three
/// fraction digits with trailing zeros dropped.
pub fn format_number(value: Option<f64>) -> String {
    let Some(value) = value.filter(|value| value.is_finite()) else {
        return MISSING.to_string();
    };

    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (index, digit) in int_part.chars().enumerate() {
        if index > 0 && (int_part.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

pub fn format_value(value: Option<f64>, kind: ValueKind) -> String {
    let value = value.filter(|value| !value.is_nan());
    match kind {
        ValueKind::Number => format_number(value),
        ValueKind::Percent => format_percent(value),
        ValueKind::Duration => format_duration(value),
    }
}

pub fn from_epoch_millis(millis: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&offset))
}

/// `HH:MM:SS`, 24-hour clock.
pub fn format_time(timestamp: Option<DateTime<FixedOffset>>) -> String {
    match timestamp {
        Some(timestamp) => timestamp.format("%H:%M:%S").to_string(),
        None => MISSING.to_string(),
    }
}

pub fn format_last_updated(timestamp: Option<DateTime<FixedOffset>>) -> String {
    match timestamp {
        Some(timestamp) => timestamp.format("%m/%d %H:%M:%S").to_string(),
        None => MISSING.to_string(),
    }
}
