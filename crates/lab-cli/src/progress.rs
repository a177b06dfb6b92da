//! Progress bar for batch runs.

use std::io::{self, IsTerminal};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files | {msg}";

/// File-level progress. Hidden when stderr is not a terminal.
pub struct BatchProgress {
    bar: ProgressBar,
    failed: usize,
}

impl BatchProgress {
    pub fn new(files: usize) -> Self {
        let bar = if io::stderr().is_terminal() {
            ProgressBar::new(files as u64)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_message("processing");
        Self { bar, failed: 0 }
    }

    /// Records one finished file.
    pub fn file_done(&mut self, path: &Path, ok: bool) {
        if !ok {
            self.failed += 1;
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(if self.failed == 0 {
            name
        } else {
            format!("{name} ({} failed)", self.failed)
        });
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
