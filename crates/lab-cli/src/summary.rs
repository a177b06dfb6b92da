use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use lab_cli::output::FileReport;
use lab_core::{Classification, ColumnScore, LIKELY_IDENTIFIER_SCORE, MetricGroup};
use lab_model::{DataType, UNKNOWN_CODE};
use lab_parse::{FieldOutcome, ParseReport, SampleIdParser, TimeFormat, format_time};

use crate::types::RunResult;

pub fn print_summary(result: &RunResult) {
    if let Some(dir) = &result.output_dir {
        println!("Output: {}", dir.display());
    }
    if result.dry_run {
        println!("Dry run: no files written");
    }
    if let Some(path) = &result.report {
        println!("Run report: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Type"),
        header_cell("ID column"),
        header_cell("Rows"),
        header_cell("Decoded"),
        header_cell("Failed"),
        header_cell("Dropped"),
        header_cell("Reps"),
        header_cell("Outputs"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 3..=8 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total_rows = 0usize;
    let mut total_decoded = 0usize;
    let mut total_failed = 0usize;
    let mut total_dropped = 0usize;
    let mut total_outputs = 0usize;
    for file in &result.files {
        total_rows += file.rows;
        total_decoded += file.decoded;
        total_failed += file.failed;
        total_dropped += file.dropped;
        total_outputs += file.outputs.len();
        table.add_row(vec![
            file_cell(file.source.as_deref()),
            type_cell(file.data_type),
            Cell::new(&file.id_column),
            Cell::new(file.rows),
            Cell::new(file.decoded),
            count_cell(file.failed, Color::Red),
            count_cell(file.dropped, Color::Yellow),
            replicate_cell(file),
            if result.dry_run {
                dim_cell("-")
            } else {
                Cell::new(file.outputs.len())
            },
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} files", result.files.len()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        Cell::new(total_decoded).add_attribute(Attribute::Bold),
        count_cell(total_failed, Color::Red).add_attribute(Attribute::Bold),
        count_cell(total_dropped, Color::Yellow).add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_outputs).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    print_failure_table(result);
}

fn print_failure_table(result: &RunResult) {
    if result.failures.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Kind"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    for failure in &result.failures {
        table.add_row(vec![
            file_cell(Some(&failure.path)),
            Cell::new(failure.kind).fg(Color::Red),
            Cell::new(&failure.message),
        ]);
    }
    println!();
    println!("Failures:");
    println!("{table}");
}

/// Prints one row per identifier with the decoded fields.
pub fn print_parse_reports(reports: &[ParseReport], parser: &SampleIdParser) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Identifier"),
        header_cell("Group"),
        header_cell("Animal"),
        header_cell("Tissue"),
        header_cell("Time"),
        header_cell("Well"),
        header_cell("Residue"),
        header_cell("Result"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);

    for report in reports {
        let residue = report
            .residue
            .as_deref()
            .map_or_else(|| dim_cell("-"), Cell::new);
        let row = match &report.result {
            Ok(parsed) => vec![
                Cell::new(&report.identifier),
                Cell::new(parsed.group),
                Cell::new(parsed.animal),
                tissue_cell(&parsed.tissue, parser),
                parsed.time_hours.map_or_else(
                    || dim_cell("-"),
                    |hours| Cell::new(format_time(hours, TimeFormat::Hm)),
                ),
                code_cell(&parsed.well),
                residue,
                anomaly_cell(report).unwrap_or_else(|| {
                    Cell::new("ok")
                        .fg(Color::Green)
                        .add_attribute(Attribute::Bold)
                }),
            ],
            Err(rejection) => vec![
                Cell::new(&report.identifier),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
                residue,
                Cell::new(rejection.reason()).fg(Color::Red),
            ],
        };
        table.add_row(row);
    }
    println!("{table}");
}

/// Everything the `classify` command reports about one table.
pub struct ClassifyView<'a> {
    pub path: &'a Path,
    pub classification: &'a Classification,
    pub id_column: Option<&'a str>,
    pub scores: &'a [ColumnScore],
    pub metric_groups: &'a [MetricGroup],
}

pub fn print_classification(view: &ClassifyView<'_>) {
    println!("File: {}", view.path.display());
    println!("Data type: {}", view.classification.data_type);
    if let Some(signal) = &view.classification.signal {
        println!("Signal: {signal}");
    }
    match view.id_column {
        Some(column) => println!("Identifier column: {column}"),
        None => println!("Identifier column: (synthesized)"),
    }

    if !view.scores.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Column"),
            header_cell("Pattern"),
            header_cell("Uniqueness"),
            header_cell("Total"),
        ]);
        apply_table_style(&mut table);
        for index in 1..=3 {
            align_column(&mut table, index, CellAlignment::Right);
        }
        for score in view.scores {
            let total = Cell::new(format!("{:.2}", score.total()));
            table.add_row(vec![
                Cell::new(&score.column),
                Cell::new(format!("{:.2}", score.pattern_score)),
                Cell::new(format!("{:.2}", score.uniqueness_score)),
                if score.total() >= LIKELY_IDENTIFIER_SCORE {
                    total.fg(Color::Green).add_attribute(Attribute::Bold)
                } else {
                    total
                },
            ]);
        }
        println!();
        println!("Identifier candidates:");
        println!("{table}");
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Metric"),
        header_cell("Columns"),
    ]);
    apply_table_style(&mut table);
    for group in view.metric_groups {
        table.add_row(vec![
            Cell::new(group.label()).fg(Color::Blue),
            Cell::new(group.columns.join("\n")),
        ]);
    }
    println!();
    println!("Metric groups:");
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn file_cell(path: Option<&Path>) -> Cell {
    match path.and_then(Path::file_name) {
        Some(name) => Cell::new(name.to_string_lossy()).add_attribute(Attribute::Bold),
        None => dim_cell("-"),
    }
}

fn type_cell(data_type: DataType) -> Cell {
    match data_type {
        DataType::FlowCytometry => Cell::new("flow").fg(Color::Blue),
        DataType::GenericLab => Cell::new("lab").fg(Color::Magenta),
    }
}

fn replicate_cell(file: &FileReport) -> Cell {
    if file.ragged {
        Cell::new(format!("{}*", file.replicate_count)).fg(Color::Yellow)
    } else {
        Cell::new(file.replicate_count)
    }
}

fn tissue_cell(code: &str, parser: &SampleIdParser) -> Cell {
    if code == UNKNOWN_CODE {
        return dim_cell(code);
    }
    let name = parser.full_tissue_name(code);
    if name == code {
        Cell::new(code)
    } else {
        Cell::new(format!("{code} ({name})"))
    }
}

fn code_cell(code: &str) -> Cell {
    if code == UNKNOWN_CODE {
        dim_cell(code)
    } else {
        Cell::new(code)
    }
}

/// First anomaly any field parser reported, if one did.
fn anomaly_cell(report: &ParseReport) -> Option<Cell> {
    report.outcomes.iter().find_map(|(kind, outcome)| match outcome {
        FieldOutcome::Anomaly(detail) => {
            Some(Cell::new(format!("{kind}: {detail}")).fg(Color::Yellow))
        }
        _ => None,
    })
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
