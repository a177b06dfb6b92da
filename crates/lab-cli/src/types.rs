use std::path::PathBuf;

use lab_cli::output::{FileReport, RunReport};
use lab_core::BatchFailure;

/// Result of a `process` or `batch` run.
#[derive(Debug)]
pub struct RunResult {
    pub files: Vec<FileReport>,
    pub failures: Vec<BatchFailure>,
    pub output_dir: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub dry_run: bool,
    pub has_errors: bool,
}

impl RunResult {
    pub fn from_report(
        report: RunReport,
        output_dir: Option<PathBuf>,
        report_path: Option<PathBuf>,
    ) -> Self {
        let has_errors = !report.failures.is_empty();
        Self {
            files: report.files,
            failures: report.failures,
            output_dir,
            report: report_path,
            dry_run: report.dry_run,
            has_errors,
        }
    }
}
