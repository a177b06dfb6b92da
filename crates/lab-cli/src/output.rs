//! Output writers: structured tables, reshaped tables and the JSON run report.
//!
//! For an input `plate.csv` the writers produce:
//! - `plate_structured.csv`: one row per sample with decoded attributes
//! - `plate_reshaped_<kind>.csv`: one file per metric kind (`count`, `freq`, ...)

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use lab_core::{
    BatchFailure, MetricGroup, ProcessedTable, ReshapeBlock, block_headers, structured_frame,
};
use lab_ingest::TextEncoding;
use lab_model::{DataType, ProcessingOptions, StructuredTable};
use lab_parse::TimeFormat;
use polars::prelude::{CsvWriter, SerWriter};
use serde::Serialize;
use tracing::{debug, info};

/// Suffix of structured table outputs.
pub const STRUCTURED_SUFFIX: &str = "_structured";
/// Infix of reshaped table outputs.
pub const RESHAPED_INFIX: &str = "_reshaped_";

/// Files written for one processed table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub structured: Option<PathBuf>,
    pub reshaped: Vec<PathBuf>,
}

impl OutputPaths {
    pub fn len(&self) -> usize {
        usize::from(self.structured.is_some()) + self.reshaped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File stem used to name outputs for `source`.
pub fn output_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string())
}

pub fn structured_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{stem}{STRUCTURED_SUFFIX}.csv"))
}

pub fn reshaped_path(output_dir: &Path, stem: &str, group: &MetricGroup) -> PathBuf {
    output_dir.join(format!("{stem}{RESHAPED_INFIX}{}.csv", group.slug()))
}

/// Writes the structured table through a polars frame.
pub fn write_structured_csv(table: &StructuredTable, path: &Path) -> Result<()> {
    let mut df = structured_frame(table)?;
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), rows = df.height(), "structured table written");
    Ok(())
}

/// Writes reshaped blocks with `Rep i` and `ID i` column pairs.
pub fn write_reshaped_csv(
    blocks: &[ReshapeBlock],
    replicate_count: usize,
    time_format: TimeFormat,
    path: &Path,
) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    writer.write_record(block_headers(replicate_count))?;
    for block in blocks {
        writer.write_record(block.record(time_format))?;
    }
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), blocks = blocks.len(), "reshaped table written");
    Ok(())
}

/// Writes the structured table and one reshaped table per metric group.
///
/// Metric groups that produce no blocks are skipped.
pub fn write_outputs(
    processed: &ProcessedTable,
    stem: &str,
    output_dir: &Path,
    time_format: TimeFormat,
) -> Result<OutputPaths> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir {}", output_dir.display()))?;

    let structured = structured_path(output_dir, stem);
    write_structured_csv(&processed.table, &structured)?;

    let mut paths = OutputPaths {
        structured: Some(structured),
        reshaped: Vec::new(),
    };
    for group in &processed.metric_groups {
        let blocks = processed.reshape_group(group)?;
        if blocks.is_empty() {
            debug!(kind = group.slug(), "no blocks for metric group");
            continue;
        }
        let path = reshaped_path(output_dir, stem, group);
        write_reshaped_csv(&blocks, processed.replicate_count(), time_format, &path)?;
        paths.reshaped.push(path);
    }
    info!(stem, files = paths.len(), "outputs written");
    Ok(paths)
}

/// Per-file entry of the run report.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: Option<PathBuf>,
    pub encoding: TextEncoding,
    pub data_type: DataType,
    /// Why the table was classified as flow cytometry, when a signal fired.
    pub signal: Option<String>,
    pub id_column: String,
    pub rows: usize,
    pub decoded: usize,
    pub failed: usize,
    pub dropped: usize,
    pub replicate_count: usize,
    pub ragged: bool,
    pub metric_groups: Vec<String>,
    pub outputs: OutputPaths,
}

impl FileReport {
    pub fn new(processed: &ProcessedTable, outputs: OutputPaths) -> Self {
        Self {
            source: processed.source.clone(),
            encoding: processed.encoding,
            data_type: processed.data_type(),
            signal: processed
                .classification
                .signal
                .as_ref()
                .map(ToString::to_string),
            id_column: processed.table.id_column.clone(),
            rows: processed.stats.rows,
            decoded: processed.stats.decoded,
            failed: processed.stats.failed,
            dropped: processed.dropped,
            replicate_count: processed.replicate_count(),
            ragged: processed.replicates.ragged,
            metric_groups: processed
                .metric_groups
                .iter()
                .map(|group| group.slug().to_string())
                .collect(),
            outputs,
        }
    }
}

/// Machine-readable summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub tool_version: &'static str,
    pub options: ProcessingOptions,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
    pub failures: Vec<BatchFailure>,
}

impl RunReport {
    pub fn new(options: ProcessingOptions, dry_run: bool) -> Self {
        Self {
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION"),
            options,
            dry_run,
            files: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Writes the run report as pretty-printed JSON.
pub fn write_run_report(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create report dir {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "run report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_follow_input_stem() {
        let dir = Path::new("out");
        let stem = output_stem(Path::new("data/plate 1.csv"));
        assert_eq!(stem, "plate 1");
        assert_eq!(
            structured_path(dir, &stem),
            PathBuf::from("out/plate 1_structured.csv")
        );
        let group = MetricGroup {
            kind: Some(lab_model::MetricKind::Frequency),
            columns: vec!["Live | Freq. of Parent".to_string()],
        };
        assert_eq!(
            reshaped_path(dir, &stem, &group),
            PathBuf::from(format!("out/plate 1_reshaped_{}.csv", group.slug()))
        );
    }

    #[test]
    fn generated_names_are_skipped_by_discovery() {
        let dir = Path::new("out");
        assert!(lab_ingest::is_generated_output(&structured_path(dir, "plate")));
        let group = MetricGroup {
            kind: None,
            columns: Vec::new(),
        };
        assert!(lab_ingest::is_generated_output(&reshaped_path(
            dir, "plate", &group
        )));
    }
}
