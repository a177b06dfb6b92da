//! Tests for lab-model types.

use lab_model::{
    DataType, GroupAnimal, MetricKind, ParsedIdentifier, ProcessingOptions, StructuredRow,
    StructuredTable, TimeUnit, UNKNOWN_CODE,
};

#[test]
fn parsed_identifier_defaults_to_unknown_codes() {
    let parsed = ParsedIdentifier::new(GroupAnimal::new(2, 3));
    assert_eq!(parsed.tissue, UNKNOWN_CODE);
    assert_eq!(parsed.well, UNKNOWN_CODE);
    assert!(parsed.time_hours.is_none());
    assert!(!parsed.has_tissue());
}

#[test]
fn time_units_convert_to_hours() {
    assert_eq!(TimeUnit::from_token("HRS"), Some(TimeUnit::Hours));
    assert_eq!(TimeUnit::from_token("mins"), Some(TimeUnit::Minutes));
    assert_eq!(TimeUnit::from_token("fortnight"), None);
    assert!((TimeUnit::Minutes.to_hours(30.0) - 0.5).abs() < 1e-12);
    assert!((TimeUnit::Days.to_hours(2.0) - 48.0).abs() < 1e-12);
    assert!((TimeUnit::Seconds.to_hours(3600.0) - 1.0).abs() < 1e-12);
}

#[test]
fn structured_table_reports_dimensions() {
    let mut table = StructuredTable::new(DataType::FlowCytometry, "SampleID", vec!["Count".into()]);
    let mut row = StructuredRow::new(0, "SP_1.1");
    row.group = Some(1);
    row.tissue = "SP".to_string();
    row.values = vec![Some(10.0)];
    table.rows.push(row);
    let mut row = StructuredRow::new(1, "BM_2.1_2h");
    row.group = Some(2);
    row.tissue = "BM".to_string();
    row.time_hours = Some(2.0);
    row.values = vec![None];
    table.rows.push(row);

    assert_eq!(table.len(), 2);
    assert_eq!(table.distinct_tissues().len(), 2);
    assert_eq!(table.distinct_groups().into_iter().collect::<Vec<_>>(), vec![1, 2]);
    assert!(table.has_time());
    assert_eq!(table.metric_index("Count"), Some(0));
    assert_eq!(table.rows[1].value(0), None);
}

#[test]
fn options_serialize() {
    let options = ProcessingOptions::strict().with_strategy("minimal");
    let json = serde_json::to_string(&options).expect("serialize options");
    let round: ProcessingOptions = serde_json::from_str(&json).expect("deserialize options");
    assert_eq!(round, options);
}

#[test]
fn metric_kinds_have_distinct_slugs() {
    let mut slugs: Vec<&str> = MetricKind::ALL.iter().map(|kind| kind.slug()).collect();
    slugs.sort_unstable();
    slugs.dedup();
    assert_eq!(slugs.len(), MetricKind::ALL.len());
}
