//! Parsing and formatting of already-formatted time values.
//!
//! These operate on values such as `2:30`, `2.5h` or `2h 30m` rather than on
//! whole sample identifiers. A plain number is read as hours here, since the
//! caller has already established that the text is a time.

use std::sync::LazyLock;

use lab_model::TimeUnit;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CLOCK_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{2})$").expect("Invalid clock time regex"));

static VERBOSE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<hours>\d+(?:\.\d+)?)\s*h)\s*(?:(?P<minutes>\d+(?:\.\d+)?)\s*m)$")
        .expect("Invalid verbose time regex")
});

static UNIT_SUFFIX_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>[a-z]+)$").expect("Invalid unit time regex")
});

static RANGE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?P<start>\d+(?:\.\d+)?)\s*-\s*(?P<end>\d+(?:\.\d+)?)\s*(?P<unit>[a-z]+)?")
        .expect("Invalid time range regex")
});

/// Upper limit (exclusive) for a plausible timepoint in hours.
pub const MAX_PLAUSIBLE_HOURS: f64 = 10_000.0;

/// Output style for [`format_time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeFormat {
    /// `2:30`
    #[default]
    Hm,
    /// `2h 30m`, or `2h` on the hour.
    HmVerbose,
    /// `2.5h`
    Decimal,
    /// Minutes below one hour, `H:MM` below a day, days above.
    Auto,
    /// Fraction of a day, as spreadsheets store times.
    ExcelSerial,
}

/// Parses a formatted time value into hours.
///
/// Accepts `H:MM`, `2h 30m`, `<number><unit>` and plain numbers (hours).
pub fn parse_formatted_time(text: &str) -> Option<f64> {
    let normalized = text.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }

    if let Some(caps) = CLOCK_FORMAT.captures(&normalized) {
        let hours: f64 = caps[1].parse().ok()?;
        let minutes: f64 = caps[2].parse().ok()?;
        if minutes >= 60.0 {
            return None;
        }
        return Some(hours + minutes / 60.0);
    }

    if let Some(caps) = VERBOSE_FORMAT.captures(&normalized) {
        let hours: f64 = caps.name("hours")?.as_str().parse().ok()?;
        let minutes: f64 = caps.name("minutes")?.as_str().parse().ok()?;
        return Some(hours + minutes / 60.0);
    }

    if let Some(caps) = UNIT_SUFFIX_FORMAT.captures(&normalized) {
        let value: f64 = caps.name("value")?.as_str().parse().ok()?;
        let unit = TimeUnit::from_token(caps.name("unit")?.as_str())?;
        return Some(unit.to_hours(value));
    }

    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses a range such as `2-4h` or `1 - 2 days` into hours.
///
/// A missing unit means hours; an unknown unit yields `None`.
pub fn parse_time_range(text: &str) -> Option<(f64, f64)> {
    let caps = RANGE_FORMAT.captures(text.trim())?;
    let start: f64 = caps.name("start")?.as_str().parse().ok()?;
    let end: f64 = caps.name("end")?.as_str().parse().ok()?;
    let unit = match caps.name("unit") {
        Some(unit) => TimeUnit::from_token(unit.as_str())?,
        None => TimeUnit::Hours,
    };
    Some((unit.to_hours(start), unit.to_hours(end)))
}

/// Formats hours using the given style.
pub fn format_time(hours: f64, format: TimeFormat) -> String {
    match format {
        TimeFormat::Hm => {
            let (whole, minutes) = split_hours(hours);
            format!("{whole}:{minutes:02}")
        }
        TimeFormat::HmVerbose => {
            let (whole, minutes) = split_hours(hours);
            if minutes == 0 {
                format!("{whole}h")
            } else {
                format!("{whole}h {minutes}m")
            }
        }
        TimeFormat::Decimal => format!("{hours:.1}h"),
        TimeFormat::Auto => {
            if hours < 1.0 {
                format!("{}min", (hours * 60.0).round() as i64)
            } else if hours < 24.0 {
                format_time(hours, TimeFormat::Hm)
            } else {
                let days = hours / 24.0;
                if days.fract() == 0.0 {
                    format!("{}d", days as i64)
                } else {
                    format!("{days:.1}d")
                }
            }
        }
        TimeFormat::ExcelSerial => to_excel_serial(hours).to_string(),
    }
}

/// Hours to a spreadsheet serial time (fraction of a day).
pub fn to_excel_serial(hours: f64) -> f64 {
    hours / 24.0
}

/// Spreadsheet serial time back to hours.
pub fn from_excel_serial(serial: f64) -> f64 {
    serial * 24.0
}

pub fn is_plausible_hours(hours: f64) -> bool {
    hours.is_finite() && (0.0..MAX_PLAUSIBLE_HOURS).contains(&hours)
}

/// Whole hours and remaining minutes, rounded to the nearest minute.
fn split_hours(hours: f64) -> (i64, i64) {
    let total_minutes = (hours * 60.0).round() as i64;
    (total_minutes.div_euclid(60), total_minutes.rem_euclid(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_round_trip() {
        let hours = parse_formatted_time("2:30").unwrap();
        assert_eq!(hours, 2.5);
        assert_eq!(format_time(hours, TimeFormat::Hm), "2:30");
        assert_eq!(parse_formatted_time("1:75"), None);
    }

    #[test]
    fn unit_suffix_and_plain_numbers() {
        assert_eq!(parse_formatted_time("2.5h"), Some(2.5));
        assert_eq!(parse_formatted_time("30 min"), Some(0.5));
        assert_eq!(parse_formatted_time("2 Days"), Some(48.0));
        assert_eq!(parse_formatted_time("4"), Some(4.0));
        assert_eq!(parse_formatted_time("2h 30m"), Some(2.5));
        assert_eq!(parse_formatted_time("soon"), None);
        assert_eq!(parse_formatted_time(""), None);
    }

    #[test]
    fn format_styles() {
        assert_eq!(format_time(2.0, TimeFormat::HmVerbose), "2h");
        assert_eq!(format_time(2.25, TimeFormat::HmVerbose), "2h 15m");
        assert_eq!(format_time(2.5, TimeFormat::Decimal), "2.5h");
        assert_eq!(format_time(0.5, TimeFormat::Auto), "30min");
        assert_eq!(format_time(5.5, TimeFormat::Auto), "5:30");
        assert_eq!(format_time(48.0, TimeFormat::Auto), "2d");
        assert_eq!(format_time(36.0, TimeFormat::Auto), "1.5d");
        assert_eq!(format_time(12.0, TimeFormat::ExcelSerial), "0.5");
    }

    #[test]
    fn ranges() {
        assert_eq!(parse_time_range("2-4h"), Some((2.0, 4.0)));
        assert_eq!(parse_time_range("1 - 2 days"), Some((24.0, 48.0)));
        assert_eq!(parse_time_range("3-6"), Some((3.0, 6.0)));
        assert_eq!(parse_time_range("3-6 fortnights"), None);
    }

    #[test]
    fn excel_serial_and_plausibility() {
        assert_eq!(from_excel_serial(to_excel_serial(6.0)), 6.0);
        assert!(is_plausible_hours(0.0));
        assert!(!is_plausible_hours(-1.0));
        assert!(!is_plausible_hours(MAX_PLAUSIBLE_HOURS));
    }
}
