//! Publication date parsing.
//!
//! RFC-822/2822 is the format RSS promises; what feeds actually ship is
//! anything but. The primary parser is chrono's RFC-2822 one, with a looser
//! format table behind it. Unparseable dates normalize to 0 — an episode is
//! never dropped over a bad `<pubDate>`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parses a feed date string into epoch seconds; 0 if nothing matches.
pub fn parse_pubdate(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return dt.timestamp();
    }

    parse_flexible(s).unwrap_or(0)
}

/// Fallback heuristics for the common non-conforming shapes: RFC 3339,
/// missing weekdays, single-digit days, naive timestamps (assumed UTC),
/// bare dates.
fn parse_flexible(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }

    const FORMATS_WITH_TZ: &[&str] = &[
        // "02 Jan 2006 15:04:05 -0700" (weekday omitted)
        "%d %b %Y %H:%M:%S %z",
        // "2 Jan 2006 15:04:05 -0700"
        "%e %b %Y %H:%M:%S %z",
        // "2006-01-02T15:04:05-0700" (compact offset)
        "%Y-%m-%dT%H:%M:%S%z",
    ];
    for fmt in FORMATS_WITH_TZ {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.timestamp());
        }
    }

    const FORMATS_NAIVE: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%d %b %Y %H:%M:%S",
        "%a, %d %b %Y %H:%M:%S",
    ];
    for fmt in FORMATS_NAIVE {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive).timestamp());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&naive).timestamp());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rfc2822_is_primary() {
        assert_eq!(parse_pubdate("Thu, 01 Jan 1970 00:00:10 +0000"), 10);
        assert_eq!(
            parse_pubdate("Mon, 02 Jan 2006 15:04:05 -0700"),
            1136239445
        );
    }

    #[test]
    fn rfc3339_fallback() {
        assert_eq!(parse_pubdate("2006-01-02T22:04:05Z"), 1136239445);
    }

    #[test]
    fn weekday_omitted_fallback() {
        assert_eq!(parse_pubdate("02 Jan 2006 15:04:05 -0700"), 1136239445);
    }

    #[test]
    fn naive_datetime_assumed_utc() {
        assert_eq!(parse_pubdate("2006-01-02 22:04:05"), 1136239445);
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        assert_eq!(parse_pubdate("1970-01-02"), 86400);
    }

    #[test]
    fn garbage_normalizes_to_zero() {
        assert_eq!(parse_pubdate("yesterday-ish"), 0);
        assert_eq!(parse_pubdate(""), 0);
        assert_eq!(parse_pubdate("  "), 0);
    }
}
