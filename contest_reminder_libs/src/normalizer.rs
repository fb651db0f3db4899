//! Start time and duration normalization shared by the contest sources.
//!
//! Every platform publishes start times differently. Each platform has a fixed list of
//! accepted formats which are tried in order; the first one that parses wins.
use crate::{contest::Platform, error::FormatError};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// CodeChef publishes wall clock times in Indian Standard Time.
const CODECHEF_UTC_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// Raw start time value as it appears in an upstream payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTime<'a> {
    Epoch(i64),
    Text(&'a str),
}

impl<'a> From<&'a str> for RawTime<'a> {
    fn from(text: &'a str) -> Self {
        RawTime::Text(text)
    }
}

impl From<i64> for RawTime<'_> {
    fn from(seconds: i64) -> Self {
        RawTime::Epoch(seconds)
    }
}

impl fmt::Display for RawTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RawTime::Epoch(seconds) => write!(f, "{}", seconds),
            RawTime::Text(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TimeFormat {
    /// Seconds since the unix epoch, as a number or a numeric string.
    EpochSeconds,
    /// Naive wall clock time interpreted at the given UTC offset.
    Naive(&'static str, i32),
    /// Same as `Naive` after collapsing runs of whitespace.
    CollapsedNaive(&'static str, i32),
    /// RFC 3339 with a `Z` or explicit offset.
    Iso8601,
}

impl TimeFormat {
    fn parse(&self, raw: RawTime) -> Option<DateTime<Utc>> {
        match (self, raw) {
            (TimeFormat::EpochSeconds, RawTime::Epoch(seconds)) => from_epoch(seconds),
            (TimeFormat::EpochSeconds, RawTime::Text(text)) => {
                text.trim().parse::<i64>().ok().and_then(from_epoch)
            }
            (TimeFormat::Naive(format, offset), RawTime::Text(text)) => {
                from_naive(text.trim(), format, *offset)
            }
            (TimeFormat::CollapsedNaive(format, offset), RawTime::Text(text)) => {
                let collapsed = WHITESPACE.replace_all(text.trim(), " ");
                from_naive(&collapsed, format, *offset)
            }
            (TimeFormat::Iso8601, RawTime::Text(text)) => DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|datetime| datetime.with_timezone(&Utc)),
            _ => None,
        }
    }
}

fn from_epoch(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

fn from_naive(text: &str, format: &str, offset_seconds: i32) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text, format).ok()?;
    let offset = FixedOffset::east_opt(offset_seconds)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|datetime| datetime.with_timezone(&Utc))
}

fn formats_for(platform: Platform) -> &'static [TimeFormat] {
    const CODEFORCES: &[TimeFormat] = &[TimeFormat::EpochSeconds];
    const LEETCODE: &[TimeFormat] = &[TimeFormat::EpochSeconds];
    const CODECHEF: &[TimeFormat] = &[
        TimeFormat::Naive("%Y-%m-%d %H:%M:%S", CODECHEF_UTC_OFFSET_SECONDS),
        TimeFormat::Naive("%d %b %Y %H:%M:%S", CODECHEF_UTC_OFFSET_SECONDS),
        TimeFormat::CollapsedNaive("%d %b %Y %H:%M:%S", CODECHEF_UTC_OFFSET_SECONDS),
        TimeFormat::Iso8601,
    ];
    const HACKERRANK: &[TimeFormat] = &[TimeFormat::Iso8601, TimeFormat::EpochSeconds];

    match platform {
        Platform::Codeforces => CODEFORCES,
        Platform::CodeChef => CODECHEF,
        Platform::LeetCode => LEETCODE,
        Platform::HackerRank => HACKERRANK,
    }
}

/// Parse a start time using the platform's formats in priority order.
pub fn parse_start_time<'a>(
    raw: impl Into<RawTime<'a>>,
    platform: Platform,
) -> Result<DateTime<Utc>, FormatError> {
    let raw = raw.into();
    formats_for(platform)
        .iter()
        .find_map(|format| format.parse(raw))
        .ok_or_else(|| FormatError {
            platform,
            raw: raw.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Seconds,
    Minutes,
}

/// Convert a published duration into a `Duration`. Missing or negative values are unknown.
pub fn resolve_duration(amount: Option<i64>, unit: DurationUnit) -> Option<Duration> {
    let amount = amount.filter(|amount| *amount >= 0)?;
    match unit {
        DurationUnit::Seconds => Some(Duration::seconds(amount)),
        DurationUnit::Minutes => Some(Duration::minutes(amount)),
    }
}

/// Duration from start to end, unknown when the end is not after the start.
pub fn duration_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Duration> {
    let duration = end - start;
    (duration > Duration::zero()).then_some(duration)
}

#[cfg(test)]
mod test {
    use super::*;

    fn utc(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_epoch_seconds() {
        let expected = utc("2024-03-15T09:00:00Z");

        assert_eq!(
            parse_start_time(1710493200i64, Platform::Codeforces).unwrap(),
            expected
        );
        assert_eq!(
            parse_start_time("1710493200", Platform::LeetCode).unwrap(),
            expected
        );
    }

    #[test]
    fn test_codechef_formats() {
        let expected = utc("2024-03-15T09:00:00+05:30");

        for raw in [
            "2024-03-15 09:00:00",
            "15 Mar 2024 09:00:00",
            "15 Mar 2024  09:00:00",
            " 15  Mar 2024\t09:00:00 ",
            "2024-03-15T03:30:00Z",
        ] {
            assert_eq!(
                parse_start_time(raw, Platform::CodeChef).unwrap(),
                expected,
                "failed to parse {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_codechef_double_space() {
        let parsed = parse_start_time("15 Mar 2024  09:00:00", Platform::CodeChef).unwrap();

        assert_eq!(parsed, utc("2024-03-15T03:30:00Z"));
    }

    #[test]
    fn test_hackerrank_iso8601() {
        assert_eq!(
            parse_start_time("2024-03-15T09:00:00Z", Platform::HackerRank).unwrap(),
            utc("2024-03-15T09:00:00Z")
        );
        assert_eq!(
            parse_start_time("2024-03-15T09:00:00.000Z", Platform::HackerRank).unwrap(),
            utc("2024-03-15T09:00:00Z")
        );
        assert_eq!(
            parse_start_time(1710493200i64, Platform::HackerRank).unwrap(),
            utc("2024-03-15T09:00:00Z")
        );
    }

    #[test]
    fn test_unknown_format() {
        for (raw, platform) in [
            ("next friday", Platform::CodeChef),
            ("2024/03/15 09:00", Platform::CodeChef),
            ("2024-03-15 09:00:00", Platform::Codeforces),
            ("", Platform::HackerRank),
            ("15 Foo 2024 09:00:00", Platform::CodeChef),
        ] {
            let error = parse_start_time(raw, platform).unwrap_err();
            assert_eq!(error.platform, platform);
            assert_eq!(error.raw, raw);
        }
    }

    #[test]
    fn test_numeric_text_is_not_a_codechef_date() {
        assert!(parse_start_time("1710493200", Platform::CodeChef).is_err());
    }

    #[test]
    fn test_resolve_duration() {
        assert_eq!(
            resolve_duration(Some(7200), DurationUnit::Seconds),
            Some(Duration::hours(2))
        );
        assert_eq!(
            resolve_duration(Some(180), DurationUnit::Minutes),
            Some(Duration::hours(3))
        );
        assert_eq!(
            resolve_duration(Some(0), DurationUnit::Seconds),
            Some(Duration::zero())
        );
        assert_eq!(resolve_duration(None, DurationUnit::Seconds), None);
        assert_eq!(resolve_duration(Some(-1), DurationUnit::Minutes), None);
    }

    #[test]
    fn test_duration_between() {
        let start = utc("2024-03-15T09:00:00Z");
        let end = utc("2024-03-15T11:30:00Z");

        assert_eq!(duration_between(start, end), Some(Duration::minutes(150)));
        assert_eq!(duration_between(end, start), None);
    }
}
