//! Conversion of raw field text into typed values

use crate::error::ParseError;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use loftwatch_domain::{ExtractedSnapshot, MonitorTarget, NormalizedReport};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Separator of the arrivals counter (`arrived/total`)
pub const COUNT_SEPARATOR: char = '/';

/// Format of UTC timestamps in reports
pub const OUTPUT_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

// DD.MM.YYYY HH:mm:ss (GMT±H[:MM]); minutes and the space before the sign are optional
static DATE_TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{2})\.(\d{2})\.(\d{4})\s+(\d{2}):(\d{2}):(\d{2})\s+\(GMT\s*([+-])(\d{1,2})(?::(\d{2}))?\)",
    )
    .expect("date/time pattern is valid")
});

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

/// Wall-clock time together with the GMT offset it was stated in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDateTime {
    /// Literal date and time fields
    pub local: NaiveDateTime,
    /// Offset from UTC in minutes, east positive
    pub offset_minutes: i32,
}

impl LocalDateTime {
    /// The same instant in UTC
    pub fn to_utc(&self) -> Option<NaiveDateTime> {
        self.local
            .checked_sub_signed(Duration::minutes(i64::from(self.offset_minutes)))
    }
}

/// Extract the first run of digits as a distance in kilometres
///
/// Absent text gives `None`. Present text without digits, or with a digit
/// run too large for `u32`, gives `Some(0)`.
pub fn parse_distance(text: Option<&str>) -> Option<u32> {
    let text = text?;
    let distance = DIGITS
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0);
    Some(distance)
}

/// Parse `DD.MM.YYYY HH:mm:ss (GMT±H[:MM])` into its local fields and offset
pub fn parse_date_time(text: &str) -> Result<LocalDateTime, ParseError> {
    let caps = DATE_TIME_PATTERN
        .captures(text)
        .ok_or_else(|| ParseError::UnrecognizedFormat(text.to_string()))?;

    let number = |index: usize| -> u32 {
        caps.get(index)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let invalid = || ParseError::InvalidDateTime(text.to_string());
    let local = NaiveDate::from_ymd_opt(number(3) as i32, number(2), number(1))
        .and_then(|date| date.and_hms_opt(number(4), number(5), number(6)))
        .ok_or_else(invalid)?;

    let magnitude = (number(8) * 60 + number(9)) as i32;
    let offset_minutes = if &caps[7] == "+" { magnitude } else { -magnitude };

    Ok(LocalDateTime {
        local,
        offset_minutes,
    })
}

/// Convert a date/time stated in a GMT offset to a UTC timestamp string
///
/// The offset is subtracted: `GMT -6:00` means UTC is six hours later than
/// the stated time, `GMT +6:00` six hours earlier.
///
/// # Examples
///
/// ```
/// use loftwatch_extractor::parse_date_time_to_utc;
///
/// assert_eq!(
///     parse_date_time_to_utc("13.11.2025 09:10:00 (GMT -6:00)").unwrap(),
///     "13.11.2025 15:10:00"
/// );
/// ```
pub fn parse_date_time_to_utc(text: &str) -> Result<String, ParseError> {
    let parsed = parse_date_time(text)?;
    let utc = parsed
        .to_utc()
        .ok_or_else(|| ParseError::InvalidDateTime(text.to_string()))?;
    Ok(utc.format(OUTPUT_FORMAT).to_string())
}

/// Second component of `A{separator}B`, trimmed
pub fn split_count(raw: &str, separator: char) -> Result<String, ParseError> {
    raw.split(separator)
        .nth(1)
        .map(|total| total.trim().to_string())
        .ok_or_else(|| ParseError::MissingSeparator {
            raw: raw.to_string(),
            separator,
        })
}

/// Build the initial report from a snapshot
///
/// Parse failures are logged and the affected field is reported as absent.
pub fn normalize_snapshot(target: &MonitorTarget, snapshot: &ExtractedSnapshot) -> NormalizedReport {
    let date_time_utc = snapshot.raw_date_time.as_deref().and_then(|raw| {
        parse_date_time_to_utc(raw)
            .map_err(|e| warn!("Failed to convert date/time to UTC: {}", e))
            .ok()
    });

    let total_count = snapshot.arrivals_raw.as_deref().and_then(|raw| {
        split_count(raw, COUNT_SEPARATOR)
            .map_err(|e| warn!("Failed to read total count: {}", e))
            .ok()
    });

    NormalizedReport {
        url: target.url().to_string(),
        title: snapshot.title.clone(),
        date_time_utc,
        distance_km: parse_distance(snapshot.raw_distance.as_deref()),
        location: snapshot.location.clone(),
        total_count,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn utc_round_trips_to_local_fields(
            year in 1970i32..2100,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..24,
            minute in 0u32..60,
            second in 0u32..60,
            positive in any::<bool>(),
            offset_hours in 0u32..=14,
            offset_minutes in prop::sample::select(vec![0u32, 30, 45]),
            with_minutes in any::<bool>(),
        ) {
            let sign = if positive { '+' } else { '-' };
            let offset = if with_minutes || offset_minutes != 0 {
                format!("{}{}:{:02}", sign, offset_hours, offset_minutes)
            } else {
                format!("{}{}", sign, offset_hours)
            };
            let input = format!(
                "{:02}.{:02}.{:04} {:02}:{:02}:{:02} (GMT {})",
                day, month, year, hour, minute, second, offset
            );

            let utc_text = parse_date_time_to_utc(&input).unwrap();
            let utc = NaiveDateTime::parse_from_str(&utc_text, OUTPUT_FORMAT).unwrap();

            let parsed = parse_date_time(&input).unwrap();
            let back = utc + Duration::minutes(i64::from(parsed.offset_minutes));

            prop_assert_eq!(
                back.format(OUTPUT_FORMAT).to_string(),
                format!("{:02}.{:02}.{:04} {:02}:{:02}:{:02}", day, month, year, hour, minute, second)
            );
        }

        #[test]
        fn distance_never_panics(text in ".*") {
            prop_assert!(parse_distance(Some(&text)).is_some());
        }
    }
}
