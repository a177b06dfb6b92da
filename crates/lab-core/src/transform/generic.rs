use std::sync::LazyLock;

use lab_ingest::CsvTable;
use lab_model::{
    CaseInsensitiveSet, DataType, MetadataColumn, ProcessingOptions, Result, StructuredRow,
    StructuredTable, TimeUnit,
};
use regex::Regex;
use tracing::{debug, warn};

use super::{TransformOutcome, TransformStats, metric_column_indices, read_metrics};

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+").expect("Invalid integer regex"));
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").expect("Invalid decimal regex"));
static DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)day\s*(\d+)").expect("Invalid day regex"));

/// Column name given to synthesized identifiers.
pub const SYNTHETIC_ID_COLUMN: &str = "SampleID";

/// First integer in a `Group` or `Replicate` cell (`"2"`, `"Group 2"`).
pub fn parse_lab_group(text: &str) -> Option<i64> {
    INTEGER
        .find(text.trim())
        .and_then(|m| m.as_str().parse().ok())
}

/// Hours from a `Timepoint` cell.
///
/// `24hr`/`2 hours` read the first number as hours, `Day 3` is 72 hours, and
/// a bare number is read in `default_unit`.
pub fn parse_lab_time(text: &str, default_unit: TimeUnit) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let lowered = text.to_ascii_lowercase();
    if lowered.contains("hr") || lowered.contains("hour") {
        return DECIMAL
            .captures(text)
            .and_then(|caps| caps[1].parse::<f64>().ok());
    }
    if lowered.contains("day") {
        return DAY
            .captures(text)
            .and_then(|caps| caps[1].parse::<f64>().ok())
            .map(|days| days * 24.0);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(default_unit.to_hours(value)),
        _ => {
            warn!(value = text, "timepoint not recognized");
            None
        }
    }
}

/// `G{g}_R{r}_T{t}`, `G{g}_R{r}` without a time column, or `Sample_{n}`
/// when group or replicate columns are absent.
pub fn synthesize_sample_id(
    group: Option<&str>,
    replicate: Option<&str>,
    time: Option<&str>,
    index: usize,
) -> String {
    match (group, replicate, time) {
        (Some(g), Some(r), Some(t)) => format!("G{g}_R{r}_T{t}"),
        (Some(g), Some(r), None) => format!("G{g}_R{r}"),
        _ => format!("Sample_{}", index + 1),
    }
}

/// Builds a structured table from explicit `Group`, `Replicate` and
/// `Timepoint` columns. Animal is the replicate number, or 1 without a
/// replicate column; tissue and well stay unknown.
pub fn transform_generic(options: &ProcessingOptions, csv: &CsvTable) -> Result<TransformOutcome> {
    let headers = CaseInsensitiveSet::new(&csv.headers);
    let locate = |column: MetadataColumn| {
        headers
            .find_column(column)
            .and_then(|name| csv.column_index(name))
    };
    let group_idx = locate(MetadataColumn::Group);
    let replicate_idx = locate(MetadataColumn::Replicate);
    let time_idx = locate(MetadataColumn::Time);
    if group_idx.is_none() || replicate_idx.is_none() {
        warn!("group or replicate column missing, using index-based sample identifiers");
    }
    if replicate_idx.is_none() {
        warn!("no replicate column, every row is animal 1");
    }

    let metric_idx = metric_column_indices(csv, &[]);
    let metric_columns = metric_idx.iter().map(|&i| csv.headers[i].clone()).collect();
    let mut table = StructuredTable::new(DataType::GenericLab, SYNTHETIC_ID_COLUMN, metric_columns);
    let mut stats = TransformStats {
        rows: csv.len(),
        ..TransformStats::default()
    };

    for idx in 0..csv.len() {
        let cell = |column: Option<usize>| column.map(|c| csv.cell(idx, c).trim());
        let group_text = cell(group_idx);
        let replicate_text = cell(replicate_idx);
        let time_text = cell(time_idx);

        let mut row = StructuredRow::new(
            idx,
            synthesize_sample_id(group_text, replicate_text, time_text, idx),
        );
        row.group = group_text.and_then(parse_lab_group);
        row.animal = match replicate_text {
            Some(text) => parse_lab_group(text),
            None => Some(1),
        };
        row.time_hours = time_text.and_then(|text| parse_lab_time(text, options.default_time_unit));

        if row.group.is_some() && row.animal.is_some() {
            stats.decoded += 1;
        } else {
            stats.failed += 1;
            debug!(row = idx, sample_id = %row.sample_id, "row has no usable group or replicate");
        }
        if row.time_hours.is_some() {
            stats.timed += 1;
        }

        row.values = read_metrics(csv, idx, &metric_idx);
        table.rows.push(row);
    }

    Ok(TransformOutcome { table, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_model::UNKNOWN_CODE;

    #[test]
    fn timepoints() {
        assert_eq!(parse_lab_time("24hr", TimeUnit::Hours), Some(24.0));
        assert_eq!(parse_lab_time("2.5 hours", TimeUnit::Hours), Some(2.5));
        assert_eq!(parse_lab_time("Day 3", TimeUnit::Hours), Some(72.0));
        assert_eq!(parse_lab_time("48", TimeUnit::Hours), Some(48.0));
        assert_eq!(parse_lab_time("2", TimeUnit::Days), Some(48.0));
        assert_eq!(parse_lab_time("baseline", TimeUnit::Hours), None);
        assert_eq!(parse_lab_time("", TimeUnit::Hours), None);
    }

    #[test]
    fn sample_ids() {
        assert_eq!(synthesize_sample_id(Some("1"), Some("2"), Some("24hr"), 0), "G1_R2_T24hr");
        assert_eq!(synthesize_sample_id(Some("1"), Some("2"), None, 0), "G1_R2");
        assert_eq!(synthesize_sample_id(Some("1"), None, None, 4), "Sample_5");
    }

    #[test]
    fn builds_rows_from_columns() {
        let csv = CsvTable::new(
            ["group", "Rep", "Timepoint", "ALT"].map(String::from).to_vec(),
            vec![
                ["1", "1", "24hr", "31"].map(String::from).to_vec(),
                ["1", "2", "24hr", "35"].map(String::from).to_vec(),
                ["Control", "1", "24hr", "28"].map(String::from).to_vec(),
            ],
        );
        let outcome = transform_generic(&ProcessingOptions::default(), &csv).unwrap();
        assert_eq!(outcome.table.metric_columns, vec!["ALT"]);
        assert_eq!(outcome.stats.decoded, 2);
        assert_eq!(outcome.stats.failed, 1);

        let row = &outcome.table.rows[1];
        assert_eq!(row.sample_id, "G1_R2_T24hr");
        assert_eq!((row.group, row.animal), (Some(1), Some(2)));
        assert_eq!(row.time_hours, Some(24.0));
        assert_eq!(row.tissue, UNKNOWN_CODE);
        assert_eq!(row.values, vec![Some(35.0)]);
    }
}
