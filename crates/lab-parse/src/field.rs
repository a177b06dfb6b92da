//! The closed set of field parsers behind one interface.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use lab_model::{GroupAnimal, LabError, WellPosition};
use serde::{Deserialize, Serialize};

use crate::group_animal::GroupAnimalParser;
use crate::time::TimeParser;
use crate::tissue::TissueParser;
use crate::well::WellParser;

/// Which attribute a field parser decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    GroupAnimal,
    Time,
    Tissue,
    Well,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GroupAnimal => "group-animal",
            Self::Time => "time",
            Self::Tissue => "tissue",
            Self::Well => "well",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = LabError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "group-animal" | "group_animal" | "group" => Ok(Self::GroupAnimal),
            "time" => Ok(Self::Time),
            "tissue" => Ok(Self::Tissue),
            "well" => Ok(Self::Well),
            other => Err(LabError::configuration(format!("unknown field parser '{other}'"))),
        }
    }
}

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    GroupAnimal(GroupAnimal),
    TimeHours(f64),
    Tissue(String),
    Well(WellPosition),
}

/// Result of running one field parser over a text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    /// The attribute was found at `span` (byte range of the parsed text).
    Matched { value: FieldValue, span: Range<usize> },
    /// Nothing recognizable; the attribute stays at its sentinel.
    Unknown,
    /// Text looked like the attribute but is malformed.
    Anomaly(String),
}

impl FieldOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Self::Matched { span, .. } => Some(span.clone()),
            _ => None,
        }
    }
}

/// Decodes one attribute from raw identifier text. Never fails on unmatched input.
pub trait FieldParser {
    fn kind(&self) -> FieldKind;

    fn parse_field(&mut self, text: &str) -> FieldOutcome;
}

/// Field parser variants a strategy can list.
#[derive(Debug, Clone)]
pub enum FieldParserVariant {
    GroupAnimal(GroupAnimalParser),
    Time(TimeParser),
    Tissue(TissueParser),
    Well(WellParser),
}

impl FieldParser for FieldParserVariant {
    fn kind(&self) -> FieldKind {
        match self {
            Self::GroupAnimal(_) => FieldKind::GroupAnimal,
            Self::Time(_) => FieldKind::Time,
            Self::Tissue(_) => FieldKind::Tissue,
            Self::Well(_) => FieldKind::Well,
        }
    }

    fn parse_field(&mut self, text: &str) -> FieldOutcome {
        match self {
            Self::GroupAnimal(parser) => parser.parse_field(text),
            Self::Time(parser) => parser.parse_field(text),
            Self::Tissue(parser) => parser.parse_field(text),
            Self::Well(parser) => parser.parse_field(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_kind_parses_names() {
        assert_eq!("Tissue".parse::<FieldKind>().ok(), Some(FieldKind::Tissue));
        assert_eq!(
            "group_animal".parse::<FieldKind>().ok(),
            Some(FieldKind::GroupAnimal)
        );
        assert!("colour".parse::<FieldKind>().is_err());
    }
}
