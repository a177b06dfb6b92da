//! Output writer tests against processed temp-dir fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use lab_cli::output::{
    FileReport, RunReport, output_stem, reshaped_path, structured_path, write_outputs,
    write_run_report,
};
use lab_core::{Pipeline, ProcessedTable};
use lab_ingest::list_csv_files;
use lab_model::ProcessingOptions;
use lab_parse::TimeFormat;
use tempfile::TempDir;

fn process(dir: &Path, name: &str, content: &str) -> (PathBuf, ProcessedTable) {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    let mut pipeline = Pipeline::new(ProcessingOptions::default()).unwrap();
    let processed = pipeline.process_file(&path).unwrap();
    (path, processed)
}

const PANEL: &str = "\
Sample,Live | Count,Live | Freq. of Parent
SP_1.1_2h.fcs,100,50%
SP_1.2_2h.fcs,110,55%
SP_2.1_2h.fcs,90,45%
";

#[test]
fn writes_structured_and_one_reshaped_file_per_metric_kind() {
    let dir = TempDir::new().unwrap();
    let (path, processed) = process(dir.path(), "panel.csv", PANEL);
    let out = dir.path().join("out");
    let stem = output_stem(&path);

    let paths = write_outputs(&processed, &stem, &out, TimeFormat::Hm).unwrap();
    assert_eq!(paths.structured, Some(structured_path(&out, "panel")));
    assert_eq!(paths.reshaped.len(), 2);
    for (group, written) in processed.metric_groups.iter().zip(&paths.reshaped) {
        assert_eq!(written, &reshaped_path(&out, "panel", group));
        assert!(written.is_file());
    }

    let count = fs::read_to_string(&paths.reshaped[0]).unwrap();
    insta::assert_snapshot!(count.trim_end(), @r"
    Tissue,Time,Group,Metric,Rep 1,Rep 2,ID 1,ID 2
    ,2:00,1,Live | Count,100,110,SP_1.1_2h.fcs,SP_1.2_2h.fcs
    ,2:00,2,Live | Count,90,,SP_2.1_2h.fcs,
    ");

    let structured = fs::read_to_string(paths.structured.unwrap()).unwrap();
    let mut lines = structured.lines();
    assert_eq!(
        lines.next().unwrap(),
        "SampleID,Group,Animal,Tissue,Well,Time,Replicate,Live | Count,Live | Freq. of Parent"
    );
    assert_eq!(lines.count(), 3);
}

#[test]
fn generated_files_are_not_picked_up_again() {
    let dir = TempDir::new().unwrap();
    let (path, processed) = process(dir.path(), "panel.csv", PANEL);
    write_outputs(&processed, &output_stem(&path), dir.path(), TimeFormat::Decimal).unwrap();

    let files = list_csv_files(dir.path()).unwrap();
    assert_eq!(files, vec![path]);
}

#[test]
fn run_report_is_json() {
    let dir = TempDir::new().unwrap();
    let (_, processed) = process(dir.path(), "panel.csv", PANEL);

    let mut report = RunReport::new(ProcessingOptions::default(), true);
    report
        .files
        .push(FileReport::new(&processed, Default::default()));
    let path = dir.path().join("reports").join("run.json");
    write_run_report(&report, &path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["dry_run"], serde_json::json!(true));
    let file = &value["files"][0];
    assert_eq!(file["id_column"], "Sample");
    assert_eq!(file["replicate_count"], serde_json::json!(2));
    assert_eq!(file["ragged"], true);
    assert_eq!(file["rows"], serde_json::json!(3));
    assert!(value["generated_at"].is_string());
}
