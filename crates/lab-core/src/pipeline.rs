//! Single-table processing pipeline with explicit stages.
//!
//! The pipeline follows these stages in order:
//! 1. **Classify**: Decide between flow cytometry and generic lab data
//! 2. **Detect**: Find the identifier column (flow cytometry only)
//! 3. **Transform**: Decode identifiers and validate dataset invariants
//! 4. **Replicates**: Map animals to replicate slots, dropping unmapped rows
//!
//! Reshape runs on demand per metric group once a table is processed.

use std::path::{Path, PathBuf};

use lab_ingest::{CsvTable, TextEncoding, read_csv_table};
use lab_model::{DataType, ProcessingOptions, StructuredTable};
use lab_parse::SampleIdParser;
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::classify::{Classification, Classifier};
use crate::columns::{MetricGroup, detect_id_column, group_metrics};
use crate::error::{CoreError, Result};
use crate::replicate::ReplicateMap;
use crate::reshape::{ReshapeBlock, reshape};
use crate::transform::{TableTransformer, TransformStats};

/// A fully processed input table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedTable {
    /// Source file, when the table was read from disk.
    pub source: Option<PathBuf>,
    pub encoding: TextEncoding,
    pub classification: Classification,
    /// Replicate-mapped rows.
    pub table: StructuredTable,
    pub replicates: ReplicateMap,
    pub stats: TransformStats,
    /// Rows dropped by the replicate mapper.
    pub dropped: usize,
    pub metric_groups: Vec<MetricGroup>,
}

impl ProcessedTable {
    pub fn data_type(&self) -> DataType {
        self.table.data_type
    }

    pub fn replicate_count(&self) -> usize {
        self.replicates.replicate_count
    }

    /// Reshapes one metric group.
    pub fn reshape_group(&self, group: &MetricGroup) -> Result<Vec<ReshapeBlock>> {
        reshape(&self.table, &self.replicates, &group.columns)
    }

    /// Reshapes the named metric columns.
    pub fn reshape_metrics(&self, metrics: &[String]) -> Result<Vec<ReshapeBlock>> {
        reshape(&self.table, &self.replicates, metrics)
    }
}

/// Owns the classifier and the identifier parser for one processing session.
///
/// The parser cache is not shared: batch runs build one pipeline per file.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: ProcessingOptions,
    classifier: Classifier,
    parser: SampleIdParser,
}

impl Pipeline {
    /// Validates the options and builds the classifier and parser.
    pub fn new(options: ProcessingOptions) -> Result<Self> {
        options.validate()?;
        let classifier = Classifier::new(&options.classifier)?;
        let parser = SampleIdParser::new(&options)?;
        debug!(strategy = %parser.strategy().name(), "pipeline ready");
        Ok(Self {
            options,
            classifier,
            parser,
        })
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    pub fn parser(&self) -> &SampleIdParser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut SampleIdParser {
        &mut self.parser
    }

    pub fn classify(&self, csv: &CsvTable) -> Classification {
        self.classifier.classify(csv)
    }

    /// Runs every stage on an in-memory table.
    pub fn process_table(&mut self, csv: &CsvTable) -> Result<ProcessedTable> {
        let classification =
            info_span!("classify", rows = csv.len()).in_scope(|| self.classifier.classify(csv));
        let data_type = classification.data_type;

        let id_column = match data_type {
            DataType::FlowCytometry => {
                Some(info_span!("detect").in_scope(|| detect_id_column(csv))?)
            }
            DataType::GenericLab => None,
        };

        let outcome = info_span!("transform", data_type = %data_type).in_scope(|| {
            TableTransformer::new(&mut self.parser, &self.options).transform(
                csv,
                data_type,
                id_column.as_deref(),
            )
        })?;
        let mut table = outcome.table;

        let (replicates, dropped) = info_span!("replicates").in_scope(|| {
            let map = ReplicateMap::build(&table, &self.options)?;
            let dropped = map.apply(&mut table);
            Ok::<_, CoreError>((map, dropped))
        })?;

        let metric_groups = group_metrics(&table.metric_columns);
        info!(
            data_type = %data_type,
            id_column = %table.id_column,
            rows = table.len(),
            replicate_count = replicates.replicate_count,
            dropped,
            metric_groups = metric_groups.len(),
            "table processed"
        );

        Ok(ProcessedTable {
            source: None,
            encoding: csv.encoding,
            classification,
            table,
            replicates,
            stats: outcome.stats,
            dropped,
            metric_groups,
        })
    }

    /// Reads and processes one file. Errors carry the file path.
    pub fn process_file(&mut self, path: &Path) -> Result<ProcessedTable> {
        let _span = info_span!("file", path = %path.display()).entered();
        self.read_and_process(path).map_err(|e| e.in_file(path))
    }

    fn read_and_process(&mut self, path: &Path) -> Result<ProcessedTable> {
        let csv = info_span!("ingest").in_scope(|| read_csv_table(path))?;
        let mut processed = self.process_table(&csv)?;
        processed.source = Some(path.to_path_buf());
        Ok(processed)
    }
}

/// Processes one file with a fresh pipeline.
pub fn process_file(path: &Path, options: &ProcessingOptions) -> Result<ProcessedTable> {
    Pipeline::new(options.clone())
        .map_err(|e| e.in_file(path))?
        .process_file(path)
}
