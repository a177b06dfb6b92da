//! Identifier column detection and metric column classification.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use lab_ingest::{CsvTable, UNNAMED_FIRST_COLUMN, is_numeric_column};
use lab_model::{LabError, MetricKind, Result, is_metadata_column};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Sub-patterns a sample identifier usually contains.
static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\d+\.\d+", r"(?i)\.fcs$", r"^[A-Z]{2,3}_", r"_[A-H]\d{1,2}_"]
        .into_iter()
        .map(|pattern| Regex::new(pattern).expect("Invalid identifier pattern regex"))
        .collect()
});

/// Score at or above which a column is considered a likely identifier column.
pub const LIKELY_IDENTIFIER_SCORE: f64 = 1.5;

/// Identifier likelihood of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnScore {
    pub column: String,
    /// Fraction of non-empty values matching any identifier sub-pattern.
    pub pattern_score: f64,
    /// Distinct / non-empty ratio.
    pub uniqueness_score: f64,
}

impl ColumnScore {
    pub fn total(&self) -> f64 {
        self.pattern_score + self.uniqueness_score
    }
}

/// Scores the values of one column.
pub fn score_column<'a>(column: &str, values: impl IntoIterator<Item = &'a str>) -> ColumnScore {
    let mut non_null = 0usize;
    let mut matching = 0usize;
    let mut distinct = HashSet::new();
    for value in values {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        non_null += 1;
        distinct.insert(value);
        if ID_PATTERNS.iter().any(|re| re.is_match(value)) {
            matching += 1;
        }
    }
    let (pattern_score, uniqueness_score) = if non_null == 0 {
        (0.0, 0.0)
    } else {
        (
            matching as f64 / non_null as f64,
            distinct.len() as f64 / non_null as f64,
        )
    };
    ColumnScore {
        column: column.to_string(),
        pattern_score,
        uniqueness_score,
    }
}

fn is_named_candidate(header: &str) -> bool {
    let lowered = header.to_ascii_lowercase();
    lowered.contains("sample")
        || lowered.contains("id")
        || header.is_empty()
        || header == UNNAMED_FIRST_COLUMN
}

/// Scores every candidate column. Named candidates take precedence over the
/// fallback pool of text columns with a positive score.
pub fn candidate_scores(table: &CsvTable) -> Vec<ColumnScore> {
    let named: Vec<ColumnScore> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, header)| is_named_candidate(header))
        .map(|(idx, header)| score_column(header, table.column_values(idx)))
        .collect();
    if !named.is_empty() {
        return named;
    }

    table
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| !is_numeric_column(table, *idx))
        .map(|(idx, header)| score_column(header, table.column_values(idx)))
        .filter(|score| score.total() > 0.0)
        .collect()
}

/// Name of the identifier column. The first column wins ties.
pub fn detect_id_column(table: &CsvTable) -> Result<String> {
    let mut best: Option<ColumnScore> = None;
    for score in candidate_scores(table) {
        debug!(
            column = %score.column,
            pattern = score.pattern_score,
            uniqueness = score.uniqueness_score,
            "identifier column candidate"
        );
        if best.as_ref().is_none_or(|current| score.total() > current.total()) {
            best = Some(score);
        }
    }
    best.map(|score| score.column)
        .ok_or_else(|| LabError::ColumnDetectionFailure {
            reason: format!(
                "none of {} columns looks like a sample identifier column",
                table.width()
            ),
        })
}

pub fn is_likely_identifier_column(table: &CsvTable, column: &str) -> bool {
    table
        .column_index(column)
        .map(|idx| score_column(column, table.column_values(idx)).total())
        .is_some_and(|score| score >= LIKELY_IDENTIFIER_SCORE)
}

/// Statistic family named by a column header, checked most specific first.
pub fn metric_kind(column: &str) -> Option<MetricKind> {
    let lowered = column.to_ascii_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();
    let has_token = |wanted: &[&str]| tokens.iter().any(|token| wanted.contains(token));

    if lowered.contains("geometric mean") || has_token(&["geomean", "gmean"]) {
        Some(MetricKind::GeometricMean)
    } else if tokens.iter().any(|token| token.starts_with("count")) {
        Some(MetricKind::Count)
    } else if tokens.iter().any(|token| token.starts_with("freq")) {
        Some(MetricKind::Frequency)
    } else if has_token(&["median"]) {
        Some(MetricKind::Median)
    } else if has_token(&["mean"]) {
        Some(MetricKind::Mean)
    } else if has_token(&["cv", "rcv"]) {
        Some(MetricKind::Cv)
    } else if has_token(&["sd", "std", "stdev", "rsd"]) {
        Some(MetricKind::Sd)
    } else {
        None
    }
}

/// Metric columns grouped by statistic family, skipping metadata columns.
pub fn metric_columns<'a>(
    headers: impl IntoIterator<Item = &'a String>,
) -> BTreeMap<MetricKind, Vec<String>> {
    let mut grouped: BTreeMap<MetricKind, Vec<String>> = BTreeMap::new();
    for header in headers {
        if is_metadata_column(header) {
            continue;
        }
        if let Some(kind) = metric_kind(header) {
            grouped.entry(kind).or_default().push(header.clone());
        }
    }
    grouped
}

/// A set of metric columns reshaped and exported together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricGroup {
    /// `None` for columns no statistic keyword matched.
    pub kind: Option<MetricKind>,
    pub columns: Vec<String>,
}

impl MetricGroup {
    pub fn label(&self) -> &'static str {
        self.kind.map_or("Values", MetricKind::label)
    }

    /// File-name token for this group.
    pub fn slug(&self) -> &'static str {
        self.kind.map_or("values", MetricKind::slug)
    }
}

/// Groups metric columns by kind; unclassified columns form a trailing group.
pub fn group_metrics(columns: &[String]) -> Vec<MetricGroup> {
    let grouped = metric_columns(columns);
    let mut groups: Vec<MetricGroup> = grouped
        .into_iter()
        .map(|(kind, columns)| MetricGroup {
            kind: Some(kind),
            columns,
        })
        .collect();
    let other: Vec<String> = columns
        .iter()
        .filter(|column| metric_kind(column).is_none() && !is_metadata_column(column))
        .cloned()
        .collect();
    if !other.is_empty() {
        groups.push(MetricGroup {
            kind: None,
            columns: other,
        });
    }
    groups
}
