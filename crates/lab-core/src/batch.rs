//! Batch processing over a directory of CSV exports.
//!
//! A failing file is recorded and the batch moves on. Each file gets its own
//! [`Pipeline`], so no parser cache is shared between files.

use std::path::{Path, PathBuf};

use lab_ingest::list_csv_files;
use lab_model::ProcessingOptions;
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::error::{CoreError, Result};
use crate::pipeline::{Pipeline, ProcessedTable};

/// A file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub path: PathBuf,
    /// Error category (`parse`, `validation`, ...).
    pub kind: &'static str,
    pub message: String,
}

/// Outcome of a batch run.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub processed: Vec<ProcessedTable>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.processed.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded() + self.failed()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Processes the given files in order.
///
/// Invalid options fail the whole batch before any file is read.
/// `on_file` is called after each file with its outcome.
pub fn process_files<F>(
    files: &[PathBuf],
    options: &ProcessingOptions,
    mut on_file: F,
) -> Result<BatchReport>
where
    F: FnMut(&Path, std::result::Result<&ProcessedTable, &CoreError>),
{
    // Configuration errors abort the batch.
    Pipeline::new(options.clone())?;

    let mut report = BatchReport::default();
    for path in files {
        let _span = info_span!("batch_file", path = %path.display()).entered();
        let outcome = Pipeline::new(options.clone()).and_then(|mut p| p.process_file(path));
        match outcome {
            Ok(processed) => {
                on_file(path, Ok(&processed));
                report.processed.push(processed);
            }
            Err(error) => {
                let error = error.in_file(path);
                warn!(kind = error.kind(), %error, "file failed");
                on_file(path, Err(&error));
                report.failures.push(BatchFailure {
                    path: path.clone(),
                    kind: error.kind(),
                    message: error.to_string(),
                });
            }
        }
    }

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch complete"
    );
    Ok(report)
}

/// Discovers CSV files in `dir` (sorted, generated outputs skipped) and
/// processes them.
pub fn process_directory<F>(
    dir: &Path,
    options: &ProcessingOptions,
    on_file: F,
) -> Result<BatchReport>
where
    F: FnMut(&Path, std::result::Result<&ProcessedTable, &CoreError>),
{
    let files = list_csv_files(dir)?;
    info!(dir = %dir.display(), files = files.len(), "csv files discovered");
    process_files(&files, options, on_file)
}
