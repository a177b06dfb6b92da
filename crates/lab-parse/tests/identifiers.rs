//! Integration tests for composite sample identifier parsing.

use lab_model::{Bounds, LabError, ParsedIdentifier, ProcessingOptions, UNKNOWN_CODE};
use lab_parse::{
    Rejection, SampleIdParser, TimeFormat, format_time, parse_formatted_time,
};
use proptest::prelude::*;

fn parser() -> SampleIdParser {
    SampleIdParser::new(&ProcessingOptions::default()).unwrap()
}

fn expected(
    group: u32,
    animal: u32,
    tissue: &str,
    well: &str,
    time_hours: Option<f64>,
) -> ParsedIdentifier {
    ParsedIdentifier {
        group,
        animal,
        tissue: tissue.to_string(),
        well: well.to_string(),
        time_hours,
    }
}

#[test]
fn valid_identifiers() {
    let cases = [
        ("SP_A1_1.1", expected(1, 1, "SP", "A1", None)),
        ("BM_B2_2.3", expected(2, 3, "BM", "B2", None)),
        ("2h_SP_A1_1.1", expected(1, 1, "SP", "A1", Some(2.0))),
        ("30min_BM_B2_2.3", expected(2, 3, "BM", "B2", Some(0.5))),
        ("1day_LN_C3_3.4", expected(3, 4, "LN", "C3", Some(24.0))),
        ("1.1", expected(1, 1, UNKNOWN_CODE, UNKNOWN_CODE, None)),
        ("10.15", expected(10, 15, UNKNOWN_CODE, UNKNOWN_CODE, None)),
        ("SP_A1_1.1.fcs", expected(1, 1, "SP", "A1", None)),
        ("2h_BM_B2_2.3.fcs", expected(2, 3, "BM", "B2", Some(2.0))),
        ("SP_1.1_2hour.fcs", expected(1, 1, "SP", UNKNOWN_CODE, Some(2.0))),
        ("Day 3_SP_1.1", expected(1, 1, "SP", UNKNOWN_CODE, Some(72.0))),
        ("Whole Blood_B1_1.1", expected(1, 1, "WB", "B1", None)),
    ];

    let mut parser = parser();
    for (identifier, want) in cases {
        assert_eq!(parser.parse(identifier), Some(want), "{identifier}");
    }
}

#[test]
fn invalid_identifiers_lenient_and_strict() {
    let mut lenient = parser();
    let mut strict = SampleIdParser::new(&ProcessingOptions::strict()).unwrap();

    for identifier in ["", "invalid", "SP_1.", "SP_.1", "SP_-1.1", "SP_1.-1"] {
        assert_eq!(lenient.parse(identifier), None, "{identifier}");
        let err = strict.try_parse(identifier).unwrap_err();
        assert!(
            matches!(err, LabError::ParseFailure { .. }),
            "{identifier}: {err}"
        );
    }
}

#[test]
fn negative_encodings_are_distinguishable() {
    let mut parser = parser();
    assert_eq!(parser.parse_outcome("SP_-1.2"), Err(Rejection::NegativeValue));
    assert_eq!(
        parser.parse_outcome("SP_x.y"),
        Err(Rejection::MissingGroupAnimal)
    );
}

#[test]
fn bounds_override_limits_pairs() {
    let options = ProcessingOptions::default().with_bounds(Bounds::new(1, 20).unwrap());
    let mut parser = SampleIdParser::new(&options).unwrap();
    assert!(parser.parse("SP_21.1").is_none());
    assert!(parser.parse("SP_20.1").is_some());
}

#[test]
fn formatted_time_round_trips() {
    let hours = parse_formatted_time("2:30").unwrap();
    assert_eq!(format_time(hours, TimeFormat::Hm), "2:30");
    assert_eq!(parse_formatted_time("2.5h"), Some(2.5));
}

proptest! {
    #[test]
    fn dotted_pairs_within_bounds_parse(group in 1u32..=999_999, animal in 1u32..=999_999) {
        let mut parser = parser();
        for identifier in [
            format!("{group}.{animal}"),
            format!("SP_A1_{group}.{animal}"),
            format!("{group}.{animal}.fcs"),
        ] {
            let parsed = parser.parse(&identifier);
            prop_assert_eq!(parsed.map(|p| (p.group, p.animal)), Some((group, animal)));
        }
    }

    #[test]
    fn parsing_is_idempotent(identifier in "[A-Za-z0-9_. -]{0,24}") {
        let mut parser = parser();
        let first = parser.parse_outcome(&identifier);
        let second = parser.parse_outcome(&identifier);
        prop_assert_eq!(&first, &second);

        let mut fresh = parser.clone();
        fresh.clear_cache();
        prop_assert_eq!(first, fresh.parse_outcome(&identifier));
    }
}
