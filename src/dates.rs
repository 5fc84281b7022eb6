// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Renders timestamps for display in list rows
pub trait DateFormatter: Send + Sync {
    /// Format a timestamp in a compact, date-only form
    fn short_date(&self, timestamp: DateTime<Utc>) -> String;
}

/// Formats dates as `M/D/YY`, e.g. `3/7/24`
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortDateFormatter;

impl DateFormatter for ShortDateFormatter {
    fn short_date(&self, timestamp: DateTime<Utc>) -> String {
        timestamp.format("%-m/%-d/%y").to_string()
    }
}

/// Parse a feed date (`pubDate`, `lastBuildDate`) into UTC
///
/// RSS requires RFC 2822, but plenty of feeds publish something close to it
/// or plain ISO 8601, so a few relaxed formats are tried as well.
pub fn parse_feed_date(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    let offset_formats = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
    ];

    for format in offset_formats {
        if let Ok(dt) = DateTime::parse_from_str(date_str, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    // No zone information at all: assume UTC
    let naive_formats = ["%a, %d %b %Y %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

    naive_formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(date_str, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn short_date_drops_leading_zeros() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 7, 18, 30, 0).unwrap();
        assert_eq!(ShortDateFormatter.short_date(ts), "3/7/24");
    }

    #[test]
    fn short_date_keeps_two_digit_components() {
        let ts = Utc.with_ymd_and_hms(2019, 11, 23, 0, 0, 0).unwrap();
        assert_eq!(ShortDateFormatter.short_date(ts), "11/23/19");
    }

    #[test]
    fn parses_rfc2822_and_normalises_to_utc() {
        let dt = parse_feed_date("Mon, 01 Jan 2024 12:00:00 +0200").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn parses_iso8601_with_offset() {
        let dt = parse_feed_date("2024-01-15T08:00:00+00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap());
    }

    #[test]
    fn parses_dates_without_zone_as_utc() {
        let dt = parse_feed_date("2024-01-15 08:00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_feed_date("last tuesday").is_none());
        assert!(parse_feed_date("").is_none());
    }
}
