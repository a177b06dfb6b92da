//! CSV table reading and cleaning.

use std::collections::HashSet;
use std::path::Path;

use csv::ReaderBuilder;

use crate::decode::{TextEncoding, decode_bytes};
use crate::error::{IngestError, Result};

/// Header given to an unnamed first column.
pub const UNNAMED_FIRST_COLUMN: &str = "Unnamed: 0";

/// First-cell words that mark a summary footer row.
const FOOTER_WORDS: &[&str] = &["mean", "sd", "average", "stddev", "total"];

/// A raw text table: one header row and rectangular string rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Encoding the source bytes were decoded with.
    pub encoding: TextEncoding,
}

impl CsvTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            encoding: TextEncoding::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Index of a header, exact match first, then case-insensitive.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header == name)
            .or_else(|| {
                self.headers
                    .iter()
                    .position(|header| header.eq_ignore_ascii_case(name.trim()))
            })
    }

    /// Cell values of one column, in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str).unwrap_or(""))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let index = self
            .column_index(name)
            .ok_or_else(|| IngestError::ColumnNotFound {
                column: name.to_string(),
            })?;
        Ok(self.column_values(index).collect())
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|values| values.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

pub(crate) fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Whether a first cell reads like a summary row (`Mean`, `SD`, `Total`, ...).
pub fn is_footer_label(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    lowered
        .split(|c: char| !c.is_ascii_alphabetic())
        .any(|word| FOOTER_WORDS.contains(&word))
}

/// Reads, decodes and cleans a CSV file.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let (text, encoding) = decode_bytes(&bytes, path)?;
    let mut table = parse_csv_text(&text, path)?;
    table.encoding = encoding;
    if table.headers.is_empty() {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    Ok(table)
}

/// Parses decoded CSV text. The first non-empty row is the header row.
///
/// `origin` is only used in error messages.
pub fn parse_csv_text(text: &str, origin: &Path) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::CsvParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        let row: Vec<String> = record.iter().map(normalize_cell).collect();
        if row.iter().all(String::is_empty) {
            continue;
        }
        raw_rows.push(row);
    }

    let mut raw_rows = raw_rows.into_iter();
    let Some(header_row) = raw_rows.next() else {
        return Ok(CsvTable::default());
    };
    let headers = unique_headers(&header_row);

    let mut rows = Vec::new();
    let mut footer_rows = 0usize;
    for record in raw_rows {
        let first = record.first().map(String::as_str).unwrap_or("");
        if is_footer_label(first) {
            footer_rows += 1;
            continue;
        }
        let row: Vec<String> = (0..headers.len())
            .map(|idx| record.get(idx).cloned().unwrap_or_default())
            .collect();
        rows.push(row);
    }
    if footer_rows > 0 {
        tracing::debug!(
            path = %origin.display(),
            footer_rows,
            "removed summary footer rows"
        );
    }

    Ok(CsvTable::new(headers, rows))
}

/// Names unnamed columns `Unnamed: <i>` and suffixes repeated names with `.1`, `.2`, ...
fn unique_headers(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .enumerate()
        .map(|(idx, value)| {
            let base = match normalize_header(value) {
                name if name.is_empty() && idx == 0 => UNNAMED_FIRST_COLUMN.to_string(),
                name if name.is_empty() => format!("Unnamed: {idx}"),
                name => name,
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{suffix}");
                suffix += 1;
            }
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> CsvTable {
        parse_csv_text(text, Path::new("test.csv")).unwrap()
    }

    #[test]
    fn test_unnamed_first_column() {
        let table = parse(",Count\nSP_1.1,10\n");
        assert_eq!(table.headers, vec!["Unnamed: 0", "Count"]);
        assert_eq!(table.rows, vec![vec!["SP_1.1", "10"]]);
    }

    #[test]
    fn test_drops_empty_and_footer_rows() {
        let table = parse("Sample,Count\nSP_1.1,10\n,\nSP_1.2,12\nMean,11\nSD,1.4\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 0), "SP_1.2");
    }

    #[test]
    fn test_footer_words_are_whole_words() {
        assert!(is_footer_label("Mean"));
        assert!(is_footer_label("Std Dev / SD"));
        assert!(is_footer_label("TOTAL events"));
        assert!(!is_footer_label("SP_1.1"));
        assert!(!is_footer_label("Meander_1.1"));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let table = parse("A,B,C\n1\n2,3,4,5\n");
        assert_eq!(table.rows[0], vec!["1", "", ""]);
        assert_eq!(table.rows[1], vec!["2", "3", "4"]);
    }

    #[test]
    fn test_duplicate_headers() {
        let table = parse("Count,Count, \n1,2,3\n");
        assert_eq!(table.headers, vec!["Count", "Count.1", "Unnamed: 2"]);
    }

    #[test]
    fn test_column_lookup() {
        let table = parse("SampleID,Count\nSP_1.1,10\n");
        assert_eq!(table.column_index("sampleid"), Some(0));
        assert_eq!(table.column("Count").unwrap(), vec!["10"]);
        assert!(matches!(
            table.column("Missing"),
            Err(IngestError::ColumnNotFound { .. })
        ));
    }
}
