//! Plate well decoding.

use std::sync::LazyLock;

use lab_model::{PlateFormat, WellPosition};
use regex::Regex;

use crate::field::{FieldKind, FieldOutcome, FieldParser, FieldValue};

/// A row letter and one or two digits, not embedded in a longer alphanumeric run.
static WELL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])(?P<row>[a-p])(?P<column>\d{1,2})(?:[^a-z0-9]|$)")
        .expect("Invalid well token regex")
});

static WELL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?P<row>[a-p])(?P<column>\d{1,2})\s*$").expect("Invalid well code regex")
});

/// Decodes well coordinates for one plate geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct WellParser {
    plate: PlateFormat,
}

impl WellParser {
    pub fn new(plate: PlateFormat) -> Self {
        Self { plate }
    }

    pub fn plate(&self) -> PlateFormat {
        self.plate
    }

    /// First well token in `text`, if it lies on the plate.
    ///
    /// Only the first token is considered; an off-plate coordinate such as
    /// `J5` on a 96-well plate yields `None` rather than a later match.
    pub fn parse(&self, text: &str) -> Option<WellPosition> {
        self.find(text).map(|(well, _)| well)
    }

    fn find(&self, text: &str) -> Option<(WellPosition, std::ops::Range<usize>)> {
        let caps = WELL_TOKEN.captures(text)?;
        let row = caps.name("row")?;
        let column = caps.name("column")?;
        let well = position(row.as_str(), column.as_str(), self.plate)?;
        Some((well, row.start()..column.end()))
    }

    /// Parses a bare well code such as `b7`.
    pub fn parse_row_col(&self, text: &str) -> Option<(char, u8)> {
        let caps = WELL_CODE.captures(text)?;
        let well = position(caps.name("row")?.as_str(), caps.name("column")?.as_str(), self.plate)?;
        Some((well.row, well.column))
    }

    /// Zero-based row-major index of a well code.
    pub fn index(&self, text: &str) -> Option<usize> {
        let (row, column) = self.parse_row_col(text)?;
        WellPosition::new(row, column, self.plate).map(|well| well.index(self.plate))
    }

    pub fn from_index(&self, index: usize) -> Option<WellPosition> {
        WellPosition::from_index(index, self.plate)
    }
}

fn position(row: &str, column: &str, plate: PlateFormat) -> Option<WellPosition> {
    let row = row.chars().next()?;
    let column: u8 = column.parse().ok()?;
    WellPosition::new(row, column, plate)
}

impl FieldParser for WellParser {
    fn kind(&self) -> FieldKind {
        FieldKind::Well
    }

    fn parse_field(&mut self, text: &str) -> FieldOutcome {
        match self.find(text) {
            Some((well, span)) => FieldOutcome::Matched {
                value: FieldValue::Well(well),
                span,
            },
            None => FieldOutcome::Unknown,
        }
    }
}
