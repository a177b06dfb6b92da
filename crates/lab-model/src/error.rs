//! Error types shared by the parsing and processing crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dataset-level invariant that a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationInvariant {
    /// Two rows share the same sample identifier.
    DuplicateIdentifier,
    /// Every row is missing a group number.
    AllGroupsMissing,
    /// Every row is missing an animal number.
    AllAnimalsMissing,
    /// A group number is below zero.
    NegativeGroup,
    /// An animal number is below zero.
    NegativeAnimal,
    /// Replicate mapping found no groups.
    NoGroups,
    /// Replicate mapping found no animals.
    NoAnimals,
    /// No row carried a parseable identifier.
    NoValidIdentifiers,
}

impl ValidationInvariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateIdentifier => "duplicate-identifier",
            Self::AllGroupsMissing => "all-groups-missing",
            Self::AllAnimalsMissing => "all-animals-missing",
            Self::NegativeGroup => "negative-group",
            Self::NegativeAnimal => "negative-animal",
            Self::NoGroups => "no-groups",
            Self::NoAnimals => "no-animals",
            Self::NoValidIdentifiers => "no-valid-identifiers",
        }
    }
}

impl fmt::Display for ValidationInvariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures that abort processing of one input table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LabError {
    /// A required identifier field could not be decoded (strict mode).
    #[error("failed to parse sample identifier '{identifier}'{}: {reason}", row_suffix(.row))]
    ParseFailure {
        identifier: String,
        row: Option<usize>,
        reason: String,
    },

    /// A dataset invariant was violated.
    #[error("validation failed [{invariant}]: {detail}")]
    ValidationFailure {
        invariant: ValidationInvariant,
        detail: String,
    },

    /// No column could be identified as the sample identifier column.
    #[error("no sample identifier column found: {reason}")]
    ColumnDetectionFailure { reason: String },

    /// Options were rejected before processing started.
    #[error("invalid configuration: {reason}")]
    ConfigurationFailure { reason: String },
}

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(index) => format!(" at row {index}"),
        None => String::new(),
    }
}

impl LabError {
    pub fn validation(invariant: ValidationInvariant, detail: impl Into<String>) -> Self {
        Self::ValidationFailure {
            invariant,
            detail: detail.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::ConfigurationFailure {
            reason: reason.into(),
        }
    }

    /// Returns the violated invariant for validation failures.
    pub fn invariant(&self) -> Option<ValidationInvariant> {
        match self {
            Self::ValidationFailure { invariant, .. } => Some(*invariant),
            _ => None,
        }
    }

    /// Attaches a row index to a parse failure that does not carry one yet.
    #[must_use]
    pub fn at_row(self, index: usize) -> Self {
        match self {
            Self::ParseFailure {
                identifier,
                row: None,
                reason,
            } => Self::ParseFailure {
                identifier,
                row: Some(index),
                reason,
            },
            other => other,
        }
    }
}

/// Result type for parsing and validation operations.
pub type Result<T> = std::result::Result<T, LabError>;
