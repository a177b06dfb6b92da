//! Layered sample identifier parsing.
//!
//! Each field parser decodes one attribute (group/animal, time, tissue or
//! well) from free-text identifiers using an ordered list of matchers. The
//! [`SampleIdParser`] runs them according to a [`ParseStrategy`] and caches
//! results per identifier.
//!
//! # Example
//!
//! ```ignore
//! use lab_model::ProcessingOptions;
//! use lab_parse::SampleIdParser;
//!
//! let mut parser = SampleIdParser::new(&ProcessingOptions::default())?;
//! let parsed = parser.parse("SP_A1_1.2_2hour.fcs").unwrap();
//! assert_eq!((parsed.group, parsed.animal), (1, 2));
//! assert_eq!(parsed.time_hours, Some(2.0));
//! ```

mod field;
mod group_animal;
mod matcher;
mod sample_id;
mod strategy;
mod time;
mod time_format;
mod tissue;
mod well;

// === Field Parsers ===
pub use field::{FieldKind, FieldOutcome, FieldParser, FieldParserVariant, FieldValue};
pub use group_animal::{
    GroupAnimalMatcher, GroupAnimalParser, group_animal_matchers, has_negative_encoding,
};
pub use matcher::PatternMatcher;
pub use time::{TimeMatch, TimeMatcher, TimeParser, time_matchers};
pub use tissue::{TissueMatch, TissueParser};
pub use well::WellParser;

// === Time Formatting ===
pub use time_format::{
    MAX_PLAUSIBLE_HOURS, TimeFormat, format_time, from_excel_serial, is_plausible_hours,
    parse_formatted_time, parse_time_range, to_excel_serial,
};

// === Composite Parser ===
pub use sample_id::{
    KNOWN_EXTENSIONS, ParseOutcome, ParseReport, Rejection, SampleIdParser, strip_extension,
};
pub use strategy::ParseStrategy;
