//! CLI argument definitions for the lab table processor.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "labproc",
    version,
    about = "Decode sample identifiers and reshape lab exports by replicate",
    long_about = "Decode free-text sample identifiers in instrument CSV exports.\n\n\
                  Writes a structured table per input and one replicate-aligned\n\
                  table per metric kind (counts, frequencies, medians, ...)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process one CSV export and write structured and reshaped tables.
    Process(ProcessArgs),

    /// Process every CSV export in a folder, continuing past failures.
    Batch(BatchArgs),

    /// Show how identifiers decode, field by field.
    Parse(ParseArgs),

    /// Report the detected data type, identifier column and metric groups.
    Classify(ClassifyArgs),
}

#[derive(Parser)]
pub struct ProcessArgs {
    /// CSV file to process.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    #[command(flatten)]
    pub processing: ProcessingArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser)]
pub struct BatchArgs {
    /// Folder containing CSV exports.
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    #[command(flatten)]
    pub processing: ProcessingArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser)]
pub struct ParseArgs {
    /// Identifiers to decode.
    #[arg(value_name = "IDENTIFIER", required = true)]
    pub identifiers: Vec<String>,

    #[command(flatten)]
    pub processing: ProcessingArgs,

    /// Print the decoded identifiers as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct ClassifyArgs {
    /// CSV file to inspect.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// JSON classifier policy (default: built-in signals).
    #[arg(long = "classifier-policy", value_name = "PATH")]
    pub classifier_policy: Option<PathBuf>,
}

/// Options shared by every command that decodes identifiers.
#[derive(Args, Clone)]
pub struct ProcessingArgs {
    /// Field-parser strategy (default, minimal).
    #[arg(long = "strategy", default_value = "default")]
    pub strategy: String,

    /// Smallest accepted group or animal number.
    #[arg(long = "min-number", default_value_t = 1)]
    pub min_number: u32,

    /// Largest accepted group or animal number.
    #[arg(long = "max-number", default_value_t = lab_model::DEFAULT_MAX_NUMBER)]
    pub max_number: u32,

    /// Plate layout used to validate well coordinates.
    #[arg(long = "plate", value_enum, default_value = "96")]
    pub plate: PlateArg,

    /// Unit of bare numeric timepoints in generic lab tables.
    #[arg(long = "time-unit", value_enum, default_value = "hours")]
    pub time_unit: TimeUnitArg,

    /// Fail on the first identifier that cannot be decoded.
    #[arg(long = "strict")]
    pub strict: bool,

    /// Restrict replicate mapping to these groups (comma-separated).
    #[arg(long = "groups", value_delimiter = ',', value_name = "N,...")]
    pub groups: Option<Vec<i64>>,

    /// Manual replicate list; its length sets the replicate count (comma-separated).
    #[arg(long = "replicates", value_delimiter = ',', value_name = "N,...")]
    pub replicates: Option<Vec<u32>>,

    /// Read tissue from the Tissue column instead of identifiers.
    #[arg(long = "manual-tissue")]
    pub manual_tissue: bool,

    /// Register an extra tissue code (repeatable).
    #[arg(long = "tissue", value_name = "CODE=NAME", value_parser = parse_tissue)]
    pub tissues: Vec<(String, String)>,

    /// JSON classifier policy (default: built-in signals).
    #[arg(long = "classifier-policy", value_name = "PATH")]
    pub classifier_policy: Option<PathBuf>,
}

/// Where and how outputs are written.
#[derive(Args, Clone)]
pub struct OutputArgs {
    /// Output directory (default: next to each input).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Time rendering in reshaped tables.
    #[arg(long = "time-format", value_enum, default_value = "hm")]
    pub time_format: TimeFormatArg,

    /// Write a JSON run report to this path.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Process and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

fn parse_tissue(value: &str) -> Result<(String, String), String> {
    let (code, name) = value
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=NAME, got '{value}'"))?;
    let (code, name) = (code.trim(), name.trim());
    if code.is_empty() || name.is_empty() {
        return Err(format!("tissue code and name must be non-empty: '{value}'"));
    }
    Ok((code.to_string(), name.to_string()))
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PlateArg {
    #[value(name = "96")]
    Wells96,
    #[value(name = "384")]
    Wells384,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TimeUnitArg {
    Seconds,
    Minutes,
    Hours,
    Days,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TimeFormatArg {
    /// 2:30
    Hm,
    /// 2h 30m
    Verbose,
    /// 2.5h
    Decimal,
    /// Scale-dependent
    Auto,
    /// Fraction of a day
    Excel,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
