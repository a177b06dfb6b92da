//! Decoded sample identifier attributes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Code used for tissue and well when the identifier does not carry one.
pub const UNKNOWN_CODE: &str = "UNK";

/// Group and animal numbers decoded from one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupAnimal {
    pub group: u32,
    pub animal: u32,
}

impl GroupAnimal {
    pub fn new(group: u32, animal: u32) -> Self {
        Self { group, animal }
    }

    /// `1.2`
    pub fn to_dot(self) -> String {
        format!("{}.{}", self.group, self.animal)
    }

    /// `G1A2`
    pub fn to_ga(self) -> String {
        format!("G{}A{}", self.group, self.animal)
    }

    /// `1_2`
    pub fn to_underscore(self) -> String {
        format!("{}_{}", self.group, self.animal)
    }
}

impl fmt::Display for GroupAnimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.animal)
    }
}

/// Microplate layout used to validate well coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlateFormat {
    /// Rows A-H, columns 1-12.
    #[default]
    Wells96,
    /// Rows A-P, columns 1-24.
    Wells384,
}

impl PlateFormat {
    pub fn rows(self) -> u8 {
        match self {
            Self::Wells96 => 8,
            Self::Wells384 => 16,
        }
    }

    pub fn columns(self) -> u8 {
        match self {
            Self::Wells96 => 12,
            Self::Wells384 => 24,
        }
    }

    pub fn well_count(self) -> usize {
        usize::from(self.rows()) * usize::from(self.columns())
    }

    /// Last valid row letter for this plate.
    pub fn last_row(self) -> char {
        char::from(b'A' + self.rows() - 1)
    }

    pub fn from_well_count(count: usize) -> Option<Self> {
        match count {
            96 => Some(Self::Wells96),
            384 => Some(Self::Wells384),
            _ => None,
        }
    }
}

/// A validated plate coordinate such as `B7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WellPosition {
    /// Uppercase row letter.
    pub row: char,
    /// 1-based column number.
    pub column: u8,
}

impl WellPosition {
    /// Builds a position if it lies on the given plate.
    pub fn new(row: char, column: u8, plate: PlateFormat) -> Option<Self> {
        let row = row.to_ascii_uppercase();
        if !row.is_ascii_uppercase() || row > plate.last_row() {
            return None;
        }
        if column == 0 || column > plate.columns() {
            return None;
        }
        Some(Self { row, column })
    }

    /// Zero-based row index.
    pub fn row_index(self) -> u8 {
        self.row as u8 - b'A'
    }

    /// Zero-based linear index in row-major order.
    pub fn index(self, plate: PlateFormat) -> usize {
        usize::from(self.row_index()) * usize::from(plate.columns()) + usize::from(self.column) - 1
    }

    /// Inverse of [`WellPosition::index`].
    pub fn from_index(index: usize, plate: PlateFormat) -> Option<Self> {
        if index >= plate.well_count() {
            return None;
        }
        let columns = usize::from(plate.columns());
        let row = u8::try_from(index / columns).ok()?;
        let column = u8::try_from(index % columns + 1).ok()?;
        Some(Self {
            row: char::from(b'A' + row),
            column,
        })
    }

    pub fn code(self) -> String {
        format!("{}{}", self.row, self.column)
    }
}

impl fmt::Display for WellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column)
    }
}

/// Structured attributes decoded from one sample identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIdentifier {
    pub group: u32,
    pub animal: u32,
    /// Tissue code, or [`UNKNOWN_CODE`].
    pub tissue: String,
    /// Well code, or [`UNKNOWN_CODE`].
    pub well: String,
    pub time_hours: Option<f64>,
}

impl ParsedIdentifier {
    pub fn new(pair: GroupAnimal) -> Self {
        Self {
            group: pair.group,
            animal: pair.animal,
            tissue: UNKNOWN_CODE.to_string(),
            well: UNKNOWN_CODE.to_string(),
            time_hours: None,
        }
    }

    pub fn group_animal(&self) -> GroupAnimal {
        GroupAnimal::new(self.group, self.animal)
    }

    pub fn has_tissue(&self) -> bool {
        self.tissue != UNKNOWN_CODE
    }

    pub fn has_well(&self) -> bool {
        self.well != UNKNOWN_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_index_round_trips_on_both_plates() {
        for plate in [PlateFormat::Wells96, PlateFormat::Wells384] {
            for index in [0, 11, 12, plate.well_count() - 1] {
                let well = WellPosition::from_index(index, plate).unwrap();
                assert_eq!(well.index(plate), index);
            }
            assert!(WellPosition::from_index(plate.well_count(), plate).is_none());
        }
    }

    #[test]
    fn well_rejects_out_of_range_coordinates() {
        assert!(WellPosition::new('I', 1, PlateFormat::Wells96).is_none());
        assert!(WellPosition::new('A', 13, PlateFormat::Wells96).is_none());
        assert!(WellPosition::new('P', 24, PlateFormat::Wells384).is_some());
        assert_eq!(
            WellPosition::new('b', 7, PlateFormat::Wells96).map(WellPosition::code),
            Some("B7".to_string())
        );
    }

    #[test]
    fn group_animal_formats() {
        let pair = GroupAnimal::new(3, 12);
        assert_eq!(pair.to_dot(), "3.12");
        assert_eq!(pair.to_ga(), "G3A12");
        assert_eq!(pair.to_underscore(), "3_12");
    }
}
