//! Data-type classification.
//!
//! Flow cytometry exports are recognized by any one of several signals; a
//! generic lab table is only accepted when no such signal exists and the
//! explicit `Group`, `Replicate` and `Timepoint` columns are present. When
//! neither applies the table is treated as flow cytometry.

use std::fmt;

use lab_ingest::CsvTable;
use lab_model::{ClassifierPolicy, DataType, LabError, MetadataColumn, Result};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, info};

/// The first signal that marked a table as flow cytometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FlowSignal {
    /// A file-extension token in headers or identifier values.
    ExtensionResidue { location: String },
    /// A population-path separator or cytometer statistic in a header.
    HeaderToken { header: String },
    /// A tissue-code prefix in headers or sampled values.
    TissuePrefix { prefix: String },
    /// A well coordinate in headers or sampled values.
    WellCoordinate { text: String },
    /// A `group.animal` token in the identifier column.
    GroupAnimalToken { value: String },
}

impl fmt::Display for FlowSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtensionResidue { location } => write!(f, "file extension in {location}"),
            Self::HeaderToken { header } => write!(f, "cytometry header '{header}'"),
            Self::TissuePrefix { prefix } => write!(f, "tissue prefix '{prefix}'"),
            Self::WellCoordinate { text } => write!(f, "well coordinate in '{text}'"),
            Self::GroupAnimalToken { value } => write!(f, "group.animal token in '{value}'"),
        }
    }
}

/// Outcome of classifying one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub data_type: DataType,
    /// Present when flow cytometry was detected by a signal rather than by default.
    pub signal: Option<FlowSignal>,
}

impl Classification {
    fn flow(signal: Option<FlowSignal>) -> Self {
        Self {
            data_type: DataType::FlowCytometry,
            signal,
        }
    }
}

/// Classifier built from a [`ClassifierPolicy`].
#[derive(Debug, Clone)]
pub struct Classifier {
    extensions: Vec<Regex>,
    headers: Vec<Regex>,
    tissue_prefixes: Vec<String>,
    wells: Vec<Regex>,
    identifier_values: Vec<Regex>,
    identifier_column_names: Vec<String>,
    sample_rows: usize,
    complex_separators: Vec<char>,
}

impl Classifier {
    /// Compiles the policy. An invalid pattern is a configuration failure.
    pub fn new(policy: &ClassifierPolicy) -> Result<Self> {
        Ok(Self {
            extensions: compile_all(&policy.extension_patterns, true)?,
            headers: compile_all(&policy.header_patterns, true)?,
            tissue_prefixes: policy.tissue_prefixes.clone(),
            wells: compile_all(&policy.well_patterns, false)?,
            identifier_values: compile_all(&policy.identifier_value_patterns, true)?,
            identifier_column_names: policy
                .identifier_column_names
                .iter()
                .map(|name| name.trim().to_ascii_lowercase())
                .collect(),
            sample_rows: policy.sample_rows,
            complex_separators: policy.complex_name_separators.clone(),
        })
    }

    pub fn classify(&self, table: &CsvTable) -> Classification {
        if table.is_empty() || table.headers.is_empty() {
            debug!("empty table, defaulting to flow cytometry");
            return Classification::flow(None);
        }

        if let Some(signal) = self.flow_signal(table) {
            info!(%signal, "flow cytometry signal detected");
            return Classification::flow(Some(signal));
        }

        if self.has_lab_columns(table) {
            info!("generic lab columns detected");
            return Classification {
                data_type: DataType::GenericLab,
                signal: None,
            };
        }

        info!("data type ambiguous, defaulting to flow cytometry");
        Classification::flow(None)
    }

    /// First flow cytometry signal, checked in a fixed order.
    pub fn flow_signal(&self, table: &CsvTable) -> Option<FlowSignal> {
        let first_values: Vec<&str> = table.column_values(0).collect();
        let sampled = &first_values[..first_values.len().min(self.sample_rows)];

        for header in &table.headers {
            if self.extensions.iter().any(|re| re.is_match(header)) {
                return Some(FlowSignal::ExtensionResidue {
                    location: format!("header '{header}'"),
                });
            }
        }
        for value in &first_values {
            if self.extensions.iter().any(|re| re.is_match(value)) {
                return Some(FlowSignal::ExtensionResidue {
                    location: format!("value '{value}'"),
                });
            }
        }

        for header in &table.headers {
            if self.headers.iter().any(|re| re.is_match(header)) {
                return Some(FlowSignal::HeaderToken {
                    header: header.clone(),
                });
            }
        }

        let first_header = table.headers[0].trim().to_ascii_lowercase();
        if self.identifier_column_names.contains(&first_header) {
            for value in sampled {
                if self.identifier_values.iter().any(|re| re.is_match(value)) {
                    return Some(FlowSignal::GroupAnimalToken {
                        value: (*value).to_string(),
                    });
                }
            }
        }

        for prefix in &self.tissue_prefixes {
            let in_header = table.headers.iter().any(|header| header.contains(prefix.as_str()));
            let in_values = sampled.iter().any(|value| value.contains(prefix.as_str()));
            if in_header || in_values {
                return Some(FlowSignal::TissuePrefix {
                    prefix: prefix.clone(),
                });
            }
        }

        for text in table.headers.iter().map(String::as_str).chain(sampled.iter().copied()) {
            if self.wells.iter().any(|re| re.is_match(text)) {
                return Some(FlowSignal::WellCoordinate {
                    text: text.to_string(),
                });
            }
        }

        None
    }

    /// `Group`, `Replicate`/`Rep` and `Timepoint`/`Time` present, with plain names.
    pub fn has_lab_columns(&self, table: &CsvTable) -> bool {
        let has = |column: MetadataColumn| {
            table.headers.iter().any(|header| {
                column
                    .aliases()
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(header.trim()))
            })
        };
        let required = has(MetadataColumn::Group)
            && has(MetadataColumn::Replicate)
            && has(MetadataColumn::Time);
        if !required {
            debug!("missing one of the Group, Replicate and Timepoint columns");
            return false;
        }
        let complex = table
            .headers
            .iter()
            .any(|header| header.contains(self.complex_separators.as_slice()));
        if complex {
            debug!("hierarchical column names rule out generic lab data");
        }
        !complex
    }
}

fn compile_all(patterns: &[String], case_insensitive: bool) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|e| {
                    LabError::configuration(format!("invalid classifier pattern '{pattern}': {e}"))
                })
        })
        .collect()
}
