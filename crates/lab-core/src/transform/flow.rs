use lab_ingest::CsvTable;
use lab_model::{
    DataType, LabError, MetadataColumn, ParseMode, ProcessingOptions, Result, StructuredRow,
    StructuredTable, TissueDetection, UNKNOWN_CODE,
};
use lab_parse::SampleIdParser;
use tracing::{debug, warn};

use super::{TransformOutcome, TransformStats, metric_column_indices, read_metrics};

/// Decodes every identifier in `id_column` and collects the metric values.
///
/// In lenient mode an undecodable identifier keeps its row with group and
/// animal unset; in strict mode it fails the table with the row index.
pub fn transform_flow(
    parser: &mut SampleIdParser,
    options: &ProcessingOptions,
    csv: &CsvTable,
    id_column: &str,
) -> Result<TransformOutcome> {
    let id_idx = csv
        .column_index(id_column)
        .ok_or_else(|| LabError::ColumnDetectionFailure {
            reason: format!("identifier column '{id_column}' is not in the table"),
        })?;

    let tissue_idx = match options.tissue_detection {
        TissueDetection::Manual => MetadataColumn::Tissue
            .aliases()
            .iter()
            .find_map(|alias| csv.column_index(alias))
            .filter(|idx| *idx != id_idx),
        TissueDetection::Auto => None,
    };

    let metric_idx = metric_column_indices(csv, &[id_idx]);
    let metric_columns = metric_idx.iter().map(|&i| csv.headers[i].clone()).collect();
    let mut table = StructuredTable::new(
        DataType::FlowCytometry,
        csv.headers[id_idx].as_str(),
        metric_columns,
    );
    let mut stats = TransformStats {
        rows: csv.len(),
        ..TransformStats::default()
    };

    for idx in 0..csv.len() {
        let identifier = csv.cell(idx, id_idx).trim();
        let mut row = StructuredRow::new(idx, identifier);

        let parsed = match options.parse_mode {
            ParseMode::Strict => Some(parser.try_parse(identifier).map_err(|e| e.at_row(idx))?),
            ParseMode::Lenient => parser.parse(identifier),
        };

        match parsed {
            Some(parsed) => {
                stats.decoded += 1;
                row.group = Some(i64::from(parsed.group));
                row.animal = Some(i64::from(parsed.animal));
                row.tissue = parsed.tissue;
                row.well = parsed.well;
                row.time_hours = parsed.time_hours;
            }
            None => {
                stats.failed += 1;
                debug!(row = idx, identifier, "identifier not decoded");
            }
        }

        if let Some(tissue_idx) = tissue_idx {
            let tissue = csv.cell(idx, tissue_idx).trim();
            row.tissue = if tissue.is_empty() {
                UNKNOWN_CODE.to_string()
            } else {
                tissue.to_string()
            };
        }
        if row.time_hours.is_some() {
            stats.timed += 1;
        }

        row.values = read_metrics(csv, idx, &metric_idx);
        table.rows.push(row);
    }

    if stats.failed > 0 {
        warn!(
            failed = stats.failed,
            rows = stats.rows,
            "identifiers could not be decoded"
        );
    }

    Ok(TransformOutcome { table, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(headers: &[&str], rows: &[&[&str]]) -> CsvTable {
        CsvTable::new(
            headers.iter().map(|h| (*h).to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| (*v).to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn decodes_rows_and_metrics() {
        let options = ProcessingOptions::default();
        let mut parser = SampleIdParser::new(&options).unwrap();
        let input = csv(
            &["Sample", "Lymphocytes | Count", "Notes"],
            &[&["SP_A1_1.1", "100", "ok"], &["junk", "90", ""]],
        );

        let outcome = transform_flow(&mut parser, &options, &input, "Sample").unwrap();
        assert_eq!(outcome.table.metric_columns, vec!["Lymphocytes | Count"]);
        assert_eq!(outcome.stats.decoded, 1);
        assert_eq!(outcome.stats.failed, 1);

        let first = &outcome.table.rows[0];
        assert_eq!((first.group, first.animal), (Some(1), Some(1)));
        assert_eq!(first.tissue, "SP");
        assert_eq!(first.well, "A1");
        assert_eq!(first.values, vec![Some(100.0)]);

        let second = &outcome.table.rows[1];
        assert_eq!(second.group, None);
        assert_eq!(second.tissue, UNKNOWN_CODE);
    }

    #[test]
    fn strict_mode_reports_row() {
        let options = ProcessingOptions::strict();
        let mut parser = SampleIdParser::new(&options).unwrap();
        let input = csv(&["Sample", "Count"], &[&["SP_1.1", "1"], &["bad", "2"]]);

        let err = transform_flow(&mut parser, &options, &input, "Sample").unwrap_err();
        assert!(matches!(err, LabError::ParseFailure { row: Some(1), .. }));
    }

    #[test]
    fn manual_tissue_reads_column() {
        let options = ProcessingOptions::default().with_tissue_detection(TissueDetection::Manual);
        let mut parser = SampleIdParser::new(&options).unwrap();
        let input = csv(
            &["Sample", "Tissue", "Count"],
            &[&["SP_1.1", "Liver", "1"], &["SP_1.2", "", "2"]],
        );

        let outcome = transform_flow(&mut parser, &options, &input, "Sample").unwrap();
        assert_eq!(outcome.table.rows[0].tissue, "Liver");
        assert_eq!(outcome.table.rows[1].tissue, UNKNOWN_CODE);
    }
}
