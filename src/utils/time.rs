use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local};

pub fn format_datetime(time: SystemTime) -> String {
    let datetime: DateTime<Local> = time.into();
    datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

pub fn format_span(start: SystemTime, end: SystemTime) -> String {
    format!("{} -> {}", format_datetime(start), format_datetime(end))
}

/// Whole milliseconds since `start`, saturating instead of truncating on overflow.
pub fn elapsed_ms(start: Instant) -> u64 {
    millis(start.elapsed())
}

pub fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
