//! Integration tests for reading instrument exports from disk.

use std::io::Write;

use lab_ingest::{IngestError, TextEncoding, is_numeric_column, list_csv_files, read_csv_table};
use tempfile::{NamedTempFile, TempDir};

fn csv_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn reads_flow_export_with_unnamed_identifier_column() {
    let file = csv_file(
        b",Lymphocytes | Freq. of Parent,Lymphocytes | Count\n\
          SP_A1_1.1.fcs,45.2,1200\n\
          SP_A2_1.2.fcs,47.9,1310\n\
          Mean,46.5,1255\n\
          SD,1.9,77\n",
    );
    let table = read_csv_table(file.path()).unwrap();

    assert_eq!(table.headers[0], "Unnamed: 0");
    assert_eq!(table.len(), 2);
    assert_eq!(table.encoding, TextEncoding::Utf8);

    assert!(is_numeric_column(&table, 2));
    assert!(!is_numeric_column(&table, 0));
}

#[test]
fn falls_back_to_single_byte_encoding() {
    let file = csv_file(b"Sample,Volume \xB5l\nSP_1.1,20\n");
    let table = read_csv_table(file.path()).unwrap();
    assert_eq!(table.encoding, TextEncoding::Windows1252);
    assert_eq!(table.headers[1], "Volume \u{b5}l");
}

#[test]
fn empty_file_is_an_error() {
    let file = csv_file(b"\n\n");
    assert!(matches!(
        read_csv_table(file.path()),
        Err(IngestError::EmptyCsv { .. })
    ));
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.csv");
    assert!(matches!(
        read_csv_table(&missing),
        Err(IngestError::FileNotFound { .. })
    ));
}

#[test]
fn discovers_sorted_inputs() {
    let dir = TempDir::new().unwrap();
    for name in ["b.csv", "a.csv", "a_structured.csv", "a_reshaped_count.csv"] {
        std::fs::write(dir.path().join(name), "x\n1\n").unwrap();
    }
    let files = list_csv_files(dir.path()).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("a.csv"));
    assert!(files[1].ends_with("b.csv"));
}
