//! Table transformation: raw CSV rows to a validated [`StructuredTable`].
//!
//! Flow cytometry tables are decoded through the composite identifier parser
//! and checked against the strict dataset invariants. Generic lab tables read
//! their metadata from explicit columns and use a looser validation path where
//! partial loss is only a warning.

mod flow;
mod generic;

use std::collections::BTreeMap;

use lab_ingest::CsvTable;
use lab_model::{
    DataType, LabError, ProcessingOptions, Result, StructuredTable, ValidationInvariant,
    is_metadata_column,
};
use lab_parse::SampleIdParser;
use serde::Serialize;
use tracing::{info, warn};

pub use flow::transform_flow;
pub use generic::{parse_lab_group, parse_lab_time, synthesize_sample_id, transform_generic};

/// Row counts gathered while transforming one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub rows: usize,
    /// Rows whose group and animal were decoded.
    pub decoded: usize,
    pub failed: usize,
    /// Rows carrying a time value.
    pub timed: usize,
}

/// A structured table and the counts it was built with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformOutcome {
    pub table: StructuredTable,
    pub stats: TransformStats,
}

/// Applies the identifier parser to every row of a table.
///
/// The parser is borrowed, so one instance (and its memo cache) is reused
/// across the rows of a file but never shared between files.
pub struct TableTransformer<'a> {
    parser: &'a mut SampleIdParser,
    options: &'a ProcessingOptions,
}

impl<'a> TableTransformer<'a> {
    pub fn new(parser: &'a mut SampleIdParser, options: &'a ProcessingOptions) -> Self {
        Self { parser, options }
    }

    /// Transforms `csv` according to its data type. `id_column` is required
    /// for flow cytometry and ignored for generic lab tables.
    pub fn transform(
        &mut self,
        csv: &CsvTable,
        data_type: DataType,
        id_column: Option<&str>,
    ) -> Result<TransformOutcome> {
        let outcome = match data_type {
            DataType::FlowCytometry => {
                let id_column = id_column.ok_or_else(|| LabError::ColumnDetectionFailure {
                    reason: "flow cytometry tables need an identifier column".to_string(),
                })?;
                let outcome = transform_flow(self.parser, self.options, csv, id_column)?;
                validate_flow(&outcome.table)?;
                outcome
            }
            DataType::GenericLab => {
                let outcome = transform_generic(self.options, csv)?;
                validate_generic(&outcome)?;
                outcome
            }
        };
        info!(
            data_type = %data_type,
            rows = outcome.stats.rows,
            decoded = outcome.stats.decoded,
            failed = outcome.stats.failed,
            metrics = outcome.table.metric_columns.len(),
            "table transformed"
        );
        Ok(outcome)
    }
}

/// Reads a metric cell. Percent signs are tolerated; anything else that is
/// not a finite number is missing.
pub fn parse_metric_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Indices of columns that carry measurements: not excluded, not metadata,
/// and holding at least one numeric value.
pub fn metric_column_indices(csv: &CsvTable, excluded: &[usize]) -> Vec<usize> {
    csv.headers
        .iter()
        .enumerate()
        .filter(|(idx, header)| !excluded.contains(idx) && !is_metadata_column(header))
        .filter(|(idx, _)| {
            csv.column_values(*idx)
                .any(|value| parse_metric_value(value).is_some())
        })
        .map(|(idx, _)| idx)
        .collect()
}

pub(crate) fn read_metrics(csv: &CsvTable, row: usize, columns: &[usize]) -> Vec<Option<f64>> {
    columns
        .iter()
        .map(|&column| parse_metric_value(csv.cell(row, column)))
        .collect()
}

fn duplicate_identifier(table: &StructuredTable) -> Option<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in &table.rows {
        if !row.sample_id.is_empty() {
            *counts.entry(row.sample_id.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .find(|(_, count)| *count > 1)
        .map(|(id, count)| (id.to_string(), count))
}

fn check_negatives(table: &StructuredTable) -> Result<()> {
    if let Some(row) = table.rows.iter().find(|row| row.group.is_some_and(|g| g < 0)) {
        return Err(LabError::validation(
            ValidationInvariant::NegativeGroup,
            format!("row {} ('{}') has a negative group", row.source_row, row.sample_id),
        ));
    }
    if let Some(row) = table.rows.iter().find(|row| row.animal.is_some_and(|a| a < 0)) {
        return Err(LabError::validation(
            ValidationInvariant::NegativeAnimal,
            format!("row {} ('{}') has a negative animal", row.source_row, row.sample_id),
        ));
    }
    Ok(())
}

/// Dataset invariants for flow cytometry tables.
pub fn validate_flow(table: &StructuredTable) -> Result<()> {
    if let Some((id, count)) = duplicate_identifier(table) {
        return Err(LabError::validation(
            ValidationInvariant::DuplicateIdentifier,
            format!("'{id}' appears {count} times"),
        ));
    }
    if !table.is_empty() {
        if table.rows.iter().all(|row| row.group.is_none()) {
            return Err(LabError::validation(
                ValidationInvariant::AllGroupsMissing,
                format!("no group could be decoded from {} rows", table.len()),
            ));
        }
        if table.rows.iter().all(|row| row.animal.is_none()) {
            return Err(LabError::validation(
                ValidationInvariant::AllAnimalsMissing,
                format!("no animal could be decoded from {} rows", table.len()),
            ));
        }
    }
    check_negatives(table)
}

/// Looser invariants for generic lab tables.
pub fn validate_generic(outcome: &TransformOutcome) -> Result<()> {
    let table = &outcome.table;
    if !table.is_empty() && outcome.stats.decoded == 0 {
        return Err(LabError::validation(
            ValidationInvariant::NoValidIdentifiers,
            format!("none of {} rows has a usable group and replicate", table.len()),
        ));
    }
    if outcome.stats.failed > 0 {
        warn!(
            lost = outcome.stats.failed,
            rows = outcome.stats.rows,
            "rows without a usable group or replicate"
        );
    }
    if let Some((id, count)) = duplicate_identifier(table) {
        warn!(sample_id = %id, count, "repeated group/replicate/time combination");
    }
    check_negatives(table)
}
