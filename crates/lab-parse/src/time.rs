//! Timepoint decoding from identifier text.
//!
//! Every matcher requires an explicit unit; a bare number is never read as
//! hours. Matchers run in order and the first one yielding a known unit wins.

use std::ops::Range;
use std::sync::LazyLock;

use lab_model::TimeUnit;

use crate::field::{FieldKind, FieldOutcome, FieldParser, FieldValue};
use crate::matcher::PatternMatcher;

/// Unit spellings allowed after a number. Longer spellings first.
const ALL_UNITS: &str =
    "days|day|d|hours|hour|hrs|hr|h|minutes|minute|mins|min|m|seconds|second|secs|sec|s";

/// Unit spellings allowed before a number. Single letters are excluded so
/// well coordinates such as `H1` are not read as times.
const WORD_UNITS: &str =
    "days|day|hours|hour|hrs|hr|minutes|minute|mins|min|seconds|second|secs|sec";

const NUMBER: &str = r"\d+(?:\.\d+)?";

static TIME_MATCHERS: LazyLock<Vec<TimeMatcher>> = LazyLock::new(|| {
    vec![
        TimeMatcher(PatternMatcher::compile(
            "timecourse",
            &format!(r"(?i)(?:^|[\s_])(?P<unit>day)\s*(?P<value>{NUMBER})(?:[\s_]|$)"),
        )),
        TimeMatcher(PatternMatcher::compile(
            "unit-first",
            &format!(
                r"(?i)(?:^|[\s_])(?P<unit>{WORD_UNITS})\s*_?(?P<value>{NUMBER})(?:[\s_.]|$)"
            ),
        )),
        TimeMatcher(PatternMatcher::compile(
            "filename",
            &format!(
                r"(?i)(?:^|[\s_\-])(?P<value>{NUMBER})\s*(?P<unit>{ALL_UNITS})(?:[\s_.\-]|$)"
            ),
        )),
        TimeMatcher(PatternMatcher::compile(
            "numeric-prefix",
            &format!(r"(?i)^(?P<value>{NUMBER})\s*(?P<unit>[a-z]+)(?:[\s_]|$)"),
        )),
        TimeMatcher(PatternMatcher::compile(
            "general",
            &format!(r"(?i)(?:^|[\s_])(?P<value>{NUMBER})\s*(?P<unit>[a-z]+)(?:[\s_]|$)"),
        )),
    ]
});

/// Ordered time matcher list.
pub fn time_matchers() -> &'static [TimeMatcher] {
    &TIME_MATCHERS
}

/// A decoded timepoint with its location in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeMatch {
    pub hours: f64,
    pub unit: TimeUnit,
    pub span: Range<usize>,
    pub matcher: &'static str,
}

/// One time pattern.
#[derive(Debug, Clone)]
pub struct TimeMatcher(PatternMatcher);

impl TimeMatcher {
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// First occurrence whose unit token is in the unit table.
    pub fn find(&self, text: &str) -> Option<TimeMatch> {
        for caps in self.0.captures_iter(text) {
            let (Some(value), Some(unit)) = (caps.name("value"), caps.name("unit")) else {
                continue;
            };
            let Some(time_unit) = TimeUnit::from_token(unit.as_str()) else {
                continue;
            };
            let Ok(number) = value.as_str().parse::<f64>() else {
                continue;
            };
            return Some(TimeMatch {
                hours: time_unit.to_hours(number),
                unit: time_unit,
                span: value.start().min(unit.start())..value.end().max(unit.end()),
                matcher: self.name(),
            });
        }
        None
    }
}

/// Decodes timepoints embedded in identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeParser;

impl TimeParser {
    pub fn new() -> Self {
        Self
    }

    /// Hours encoded in `text`, if any.
    pub fn parse(&self, text: &str) -> Option<f64> {
        self.find(text).map(|found| found.hours)
    }

    pub fn find(&self, text: &str) -> Option<TimeMatch> {
        if text.trim().is_empty() {
            return None;
        }
        time_matchers().iter().find_map(|matcher| matcher.find(text))
    }
}

impl FieldParser for TimeParser {
    fn kind(&self) -> FieldKind {
        FieldKind::Time
    }

    fn parse_field(&mut self, text: &str) -> FieldOutcome {
        match self.find(text) {
            Some(found) => FieldOutcome::Matched {
                value: FieldValue::TimeHours(found.hours),
                span: found.span,
            },
            None => FieldOutcome::Unknown,
        }
    }
}
