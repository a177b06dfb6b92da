use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::DataType;
use crate::identifier::UNKNOWN_CODE;

/// One input row after identifier decoding and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRow {
    /// Source row index within the input table.
    pub source_row: usize,
    pub sample_id: String,
    pub group: Option<i64>,
    pub animal: Option<i64>,
    pub tissue: String,
    pub well: String,
    pub time_hours: Option<f64>,
    /// Attached by the replicate mapper.
    pub replicate: Option<u32>,
    /// Metric values aligned with [`StructuredTable::metric_columns`].
    pub values: Vec<Option<f64>>,
}

impl StructuredRow {
    pub fn new(source_row: usize, sample_id: impl Into<String>) -> Self {
        Self {
            source_row,
            sample_id: sample_id.into(),
            group: None,
            animal: None,
            tissue: UNKNOWN_CODE.to_string(),
            well: UNKNOWN_CODE.to_string(),
            time_hours: None,
            replicate: None,
            values: Vec::new(),
        }
    }

    pub fn value(&self, metric_index: usize) -> Option<f64> {
        self.values.get(metric_index).copied().flatten()
    }
}

/// Decoded table produced by the transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredTable {
    pub data_type: DataType,
    /// Name of the column the identifiers were read from.
    pub id_column: String,
    pub metric_columns: Vec<String>,
    pub rows: Vec<StructuredRow>,
}

impl StructuredTable {
    pub fn new(data_type: DataType, id_column: impl Into<String>, metric_columns: Vec<String>) -> Self {
        Self {
            data_type,
            id_column: id_column.into(),
            metric_columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn metric_index(&self, name: &str) -> Option<usize> {
        self.metric_columns.iter().position(|column| column == name)
    }

    pub fn distinct_tissues(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|row| row.tissue.as_str()).collect()
    }

    pub fn distinct_groups(&self) -> BTreeSet<i64> {
        self.rows.iter().filter_map(|row| row.group).collect()
    }

    pub fn has_time(&self) -> bool {
        self.rows.iter().any(|row| row.time_hours.is_some())
    }
}
