//! Human-readable formatting of sizes and timestamps.

use chrono::{DateTime, Local, TimeZone};

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary (1024) steps, e.g. `1.5 KB`.
///
/// Trailing zeros are dropped (`1 KB`, not `1.00 KB`); zero is `0 Bytes`.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rendered = format!("{:.*}", decimals, value);
    let trimmed = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered.as_str()
    };
    format!("{} {}", trimmed, UNITS[unit])
}

/// Format a unix timestamp in local time, e.g. `14 Oct 2026, 03:45 PM`.
pub fn format_timestamp(unix_secs: i64) -> String {
    format_timestamp_in(unix_secs, &Local)
}

pub fn format_timestamp_in<Tz: TimeZone>(unix_secs: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::from_timestamp(unix_secs, 0) {
        Some(utc) => utc
            .with_timezone(tz)
            .format("%-d %b %Y, %I:%M %p")
            .to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn zero_bytes() {
        assert_eq!(format_bytes(0, 2), "0 Bytes");
    }

    #[test]
    fn small_values_stay_in_bytes() {
        assert_eq!(format_bytes(1, 2), "1 Bytes");
        assert_eq!(format_bytes(1023, 2), "1023 Bytes");
    }

    #[test]
    fn scales_and_trims() {
        assert_eq!(format_bytes(1024, 2), "1 KB");
        assert_eq!(format_bytes(1536, 2), "1.5 KB");
        assert_eq!(format_bytes(1_048_576, 2), "1 MB");
        assert_eq!(format_bytes(1_234_567_890, 2), "1.15 GB");
    }

    #[test]
    fn caps_at_terabytes() {
        assert_eq!(format_bytes(1024u64.pow(5), 0), "1024 TB");
    }

    #[test]
    fn zero_decimals() {
        assert_eq!(format_bytes(1536, 0), "2 KB");
    }

    #[test]
    fn timestamp_in_utc() {
        assert_eq!(format_timestamp_in(0, &Utc), "1 Jan 1970, 12:00 AM");
        assert_eq!(
            format_timestamp_in(1_700_000_000, &Utc),
            "14 Nov 2023, 10:13 PM"
        );
    }
}
