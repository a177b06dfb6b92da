use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::json;
use tracing::{info, info_span, warn};

use lab_cli::output::{
    FileReport, OutputPaths, RunReport, output_stem, write_outputs, write_run_report,
};
use lab_core::{
    BatchFailure, Classifier, Pipeline, ProcessedTable, candidate_scores, detect_id_column,
    group_metrics, metric_column_indices, process_files,
};
use lab_ingest::{list_csv_files, read_csv_table};
use lab_model::{
    Bounds, ClassifierPolicy, DataType, PlateFormat, ProcessingOptions, TimeUnit, TissueDetection,
};
use lab_parse::{SampleIdParser, TimeFormat};

use crate::cli::{
    BatchArgs, ClassifyArgs, OutputArgs, ParseArgs, PlateArg, ProcessArgs, ProcessingArgs,
    TimeFormatArg, TimeUnitArg,
};
use crate::progress::BatchProgress;
use crate::summary::{ClassifyView, print_classification, print_parse_reports};
use crate::types::RunResult;

pub fn run_process(args: &ProcessArgs) -> Result<RunResult> {
    let options = options_from_args(&args.processing)?;
    let _span = info_span!("process", input = %args.input.display()).entered();

    let mut pipeline = Pipeline::new(options.clone())?;
    let processed = pipeline.process_file(&args.input)?;

    let output_dir = args.output.output_dir.clone().unwrap_or_else(|| {
        args.input
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    });

    let mut report = RunReport::new(options, args.output.dry_run);
    let outputs = emit_outputs(&processed, &output_dir, &args.output)?;
    report.files.push(FileReport::new(&processed, outputs));
    finish_run(report, output_dir, &args.output)
}

pub fn run_batch(args: &BatchArgs) -> Result<RunResult> {
    let options = options_from_args(&args.processing)?;
    let _span = info_span!("batch", folder = %args.folder.display()).entered();

    let files = list_csv_files(&args.folder)
        .with_context(|| format!("list {}", args.folder.display()))?;
    if files.is_empty() {
        warn!(folder = %args.folder.display(), "no csv files found");
    }
    let output_dir = args
        .output
        .output_dir
        .clone()
        .unwrap_or_else(|| args.folder.clone());

    let mut progress = BatchProgress::new(files.len());
    let batch = process_files(&files, &options, |path, outcome| {
        progress.file_done(path, outcome.is_ok());
    })?;
    progress.finish();

    let mut report = RunReport::new(options, args.output.dry_run);
    for processed in &batch.processed {
        match emit_outputs(processed, &output_dir, &args.output) {
            Ok(outputs) => report.files.push(FileReport::new(processed, outputs)),
            Err(error) => {
                let path = processed.source.clone().unwrap_or_default();
                warn!(path = %path.display(), error = %error, "writing outputs failed");
                report.failures.push(BatchFailure {
                    path,
                    kind: "output",
                    message: format!("{error:#}"),
                });
            }
        }
    }
    report.failures.extend(batch.failures);
    info!(
        files = report.files.len(),
        failures = report.failures.len(),
        "batch finished"
    );
    finish_run(report, output_dir, &args.output)
}

/// Returns `true` when every identifier decoded.
pub fn run_parse(args: &ParseArgs) -> Result<bool> {
    let options = options_from_args(&args.processing)?;
    options.validate()?;
    let mut parser = SampleIdParser::new(&options)?;
    let reports: Vec<_> = args
        .identifiers
        .iter()
        .map(|identifier| parser.explain(identifier))
        .collect();
    let all_decoded = reports.iter().all(|report| report.result.is_ok());

    if args.json {
        let values: Vec<_> = reports
            .iter()
            .map(|report| match &report.result {
                Ok(parsed) => json!({
                    "identifier": report.identifier,
                    "parsed": parsed,
                    "residue": report.residue,
                }),
                Err(rejection) => json!({
                    "identifier": report.identifier,
                    "rejection": rejection.reason(),
                    "residue": report.residue,
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        print_parse_reports(&reports, &parser);
    }
    Ok(all_decoded)
}

pub fn run_classify(args: &ClassifyArgs) -> Result<()> {
    let csv = read_csv_table(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let policy = match &args.classifier_policy {
        Some(path) => load_classifier_policy(path)?,
        None => ClassifierPolicy::default(),
    };
    let classifier = Classifier::new(&policy)?;
    let classification = classifier.classify(&csv);

    let id_column = match classification.data_type {
        DataType::FlowCytometry => Some(detect_id_column(&csv)?),
        DataType::GenericLab => None,
    };
    let excluded: Vec<usize> = id_column
        .as_deref()
        .and_then(|column| csv.column_index(column))
        .into_iter()
        .collect();
    let metric_names: Vec<String> = metric_column_indices(&csv, &excluded)
        .into_iter()
        .map(|index| csv.headers[index].clone())
        .collect();
    let metric_groups = group_metrics(&metric_names);
    let scores = candidate_scores(&csv);

    print_classification(&ClassifyView {
        path: &args.input,
        classification: &classification,
        id_column: id_column.as_deref(),
        scores: &scores,
        metric_groups: &metric_groups,
    });
    Ok(())
}

/// Builds processing options from CLI flags.
pub fn options_from_args(args: &ProcessingArgs) -> Result<ProcessingOptions> {
    let mut options = if args.strict {
        ProcessingOptions::strict()
    } else {
        ProcessingOptions::default()
    };
    options = options
        .with_strategy(args.strategy.clone())
        .with_bounds(Bounds::new(args.min_number, args.max_number)?)
        .with_plate_format(match args.plate {
            PlateArg::Wells96 => PlateFormat::Wells96,
            PlateArg::Wells384 => PlateFormat::Wells384,
        })
        .with_default_time_unit(match args.time_unit {
            TimeUnitArg::Seconds => TimeUnit::Seconds,
            TimeUnitArg::Minutes => TimeUnit::Minutes,
            TimeUnitArg::Hours => TimeUnit::Hours,
            TimeUnitArg::Days => TimeUnit::Days,
        });

    match (&args.groups, &args.replicates) {
        (Some(groups), Some(replicates)) => {
            options = options.with_manual_replicates(groups.clone(), replicates.clone());
        }
        (Some(groups), None) => options = options.with_groups(groups.clone()),
        (None, Some(_)) => bail!("--replicates requires --groups"),
        (None, None) => {}
    }
    if args.manual_tissue {
        options = options.with_tissue_detection(TissueDetection::Manual);
    }
    for (code, name) in &args.tissues {
        options = options.with_extra_tissue(code.clone(), name.clone());
    }
    if let Some(path) = &args.classifier_policy {
        options = options.with_classifier(load_classifier_policy(path)?);
    }
    Ok(options)
}

/// Reads a JSON classifier policy. Missing fields keep their defaults.
pub fn load_classifier_policy(path: &Path) -> Result<ClassifierPolicy> {
    let file = File::open(path)
        .with_context(|| format!("open classifier policy {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse classifier policy {}", path.display()))
}

fn time_format(arg: TimeFormatArg) -> TimeFormat {
    match arg {
        TimeFormatArg::Hm => TimeFormat::Hm,
        TimeFormatArg::Verbose => TimeFormat::HmVerbose,
        TimeFormatArg::Decimal => TimeFormat::Decimal,
        TimeFormatArg::Auto => TimeFormat::Auto,
        TimeFormatArg::Excel => TimeFormat::ExcelSerial,
    }
}

fn emit_outputs(
    processed: &ProcessedTable,
    output_dir: &Path,
    args: &OutputArgs,
) -> Result<OutputPaths> {
    if args.dry_run {
        return Ok(OutputPaths::default());
    }
    let stem = processed
        .source
        .as_deref()
        .map_or_else(|| "table".to_string(), output_stem);
    write_outputs(processed, &stem, output_dir, time_format(args.time_format))
}

fn finish_run(report: RunReport, output_dir: PathBuf, args: &OutputArgs) -> Result<RunResult> {
    if let Some(path) = &args.report {
        write_run_report(&report, path)?;
    }
    let output_dir = (!args.dry_run).then_some(output_dir);
    Ok(RunResult::from_report(report, output_dir, args.report.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use lab_model::{ParseMode, ReplicateMode};

    use crate::cli::{Cli, Command};

    fn processing(args: &[&str]) -> ProcessingArgs {
        let mut argv = vec!["labproc", "parse", "SP_1.1"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Parse(parse) => parse.processing,
            _ => panic!("expected parse command"),
        }
    }

    #[test]
    fn manual_replicates_need_both_lists() {
        let args = processing(&["--groups", "1,2", "--replicates", "1,2,3"]);
        let options = options_from_args(&args).unwrap();
        assert_eq!(options.replicates, Some(vec![1, 2, 3]));
        assert!(options.validate().is_ok());

        assert!(options_from_args(&processing(&["--replicates", "1,2"])).is_err());
    }

    #[test]
    fn flags_map_onto_options() {
        let options = options_from_args(&processing(&[
            "--strict",
            "--plate",
            "384",
            "--time-unit",
            "days",
            "--manual-tissue",
            "--tissue",
            "SK=Skin",
        ]))
        .unwrap();
        assert_eq!(options.parse_mode, ParseMode::Strict);
        assert_eq!(options.plate_format, PlateFormat::Wells384);
        assert_eq!(options.default_time_unit, TimeUnit::Days);
        assert_eq!(options.tissue_detection, TissueDetection::Manual);
        assert_eq!(
            options.extra_tissues,
            vec![("SK".to_string(), "Skin".to_string())]
        );
    }

    #[test]
    fn replicate_list_length_sets_the_count() {
        let args = processing(&["--groups", "1", "--replicates", "7,9"]);
        let options = options_from_args(&args).unwrap();
        assert_eq!(options.replicate_mode, ReplicateMode::Manual);
        assert_eq!(options.replicates.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn classifier_policy_is_read_from_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{"sample_rows": 3, "tissue_prefixes": ["LN_"]}"#).unwrap();

        let policy = load_classifier_policy(&path).unwrap();
        assert_eq!(policy.sample_rows, 3);
        assert_eq!(policy.tissue_prefixes, vec!["LN_".to_string()]);
        assert_eq!(
            policy.header_patterns,
            ClassifierPolicy::default().header_patterns
        );

        let path_arg = path.to_string_lossy().into_owned();
        let options =
            options_from_args(&processing(&["--classifier-policy", &path_arg])).unwrap();
        assert_eq!(options.classifier, policy);

        std::fs::write(&path, "{not json").unwrap();
        assert!(load_classifier_policy(&path).is_err());
        assert!(load_classifier_policy(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let args = processing(&["--min-number", "9", "--max-number", "2"]);
        assert!(options_from_args(&args).is_err());
    }
}
