use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit of a time token, convertible to hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    #[default]
    Hours,
    Days,
}

impl TimeUnit {
    /// Multiplier converting a value in this unit to hours.
    pub fn hours_factor(self) -> f64 {
        match self {
            Self::Seconds => 1.0 / 3600.0,
            Self::Minutes => 1.0 / 60.0,
            Self::Hours => 1.0,
            Self::Days => 24.0,
        }
    }

    pub fn to_hours(self, value: f64) -> f64 {
        match self {
            Self::Seconds => value / 3600.0,
            Self::Minutes => value / 60.0,
            Self::Hours => value,
            Self::Days => value * 24.0,
        }
    }

    /// Resolves a unit token (`h`, `hrs`, `min`, `days`, ...), case-insensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(Self::Seconds),
            "m" | "min" | "mins" | "minute" | "minutes" => Some(Self::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(Self::Hours),
            "d" | "day" | "days" => Some(Self::Days),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        }
    }
}

/// Shape of an input table, which selects the transform strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    FlowCytometry,
    GenericLab,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FlowCytometry => "flow cytometry",
            Self::GenericLab => "generic lab",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistic family of a metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    Count,
    Frequency,
    Median,
    GeometricMean,
    Mean,
    Cv,
    Sd,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        Self::Count,
        Self::Frequency,
        Self::Median,
        Self::GeometricMean,
        Self::Mean,
        Self::Cv,
        Self::Sd,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Frequency => "Frequency",
            Self::Median => "Median",
            Self::GeometricMean => "Geometric Mean",
            Self::Mean => "Mean",
            Self::Cv => "CV",
            Self::Sd => "SD",
        }
    }

    /// Lowercase token used in output file names.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Frequency => "frequency",
            Self::Median => "median",
            Self::GeometricMean => "geomean",
            Self::Mean => "mean",
            Self::Cv => "cv",
            Self::Sd => "sd",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
