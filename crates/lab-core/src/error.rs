//! Error types for table processing.

use std::path::PathBuf;

use lab_ingest::IngestError;
use lab_model::LabError;
use thiserror::Error;

/// Errors raised while processing one input table.
#[derive(Debug, Error)]
pub enum CoreError {
    // =========================================================================
    // PROCESSING ERRORS
    // =========================================================================
    /// Parse, validation, column detection or configuration failure.
    #[error(transparent)]
    Lab(#[from] LabError),

    /// The input table could not be read.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// A metric column requested for reshape does not exist.
    #[error("metric column not found: {column}")]
    MetricNotFound { column: String },

    /// Building the structured DataFrame failed.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    // =========================================================================
    // FILE CONTEXT
    // =========================================================================
    /// Any of the above, tagged with the file it occurred in.
    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<CoreError>,
    },
}

impl From<polars::prelude::PolarsError> for CoreError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl CoreError {
    /// Tags the error with a file path unless it already carries one.
    #[must_use]
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::File { .. } => self,
            other => Self::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying processing error, if any.
    pub fn lab_error(&self) -> Option<&LabError> {
        match self {
            Self::Lab(err) => Some(err),
            Self::File { source, .. } => source.lab_error(),
            _ => None,
        }
    }

    /// Short category name for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lab(LabError::ParseFailure { .. }) => "parse",
            Self::Lab(LabError::ValidationFailure { .. }) => "validation",
            Self::Lab(LabError::ColumnDetectionFailure { .. }) => "column-detection",
            Self::Lab(LabError::ConfigurationFailure { .. }) => "configuration",
            Self::Ingest(_) => "ingest",
            Self::MetricNotFound { .. } => "metric",
            Self::DataFrame { .. } => "dataframe",
            Self::File { source, .. } => source.kind(),
        }
    }
}

/// Result type for processing operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lab_model::ValidationInvariant;

    #[test]
    fn test_file_context_wraps_once() {
        let err = CoreError::from(LabError::validation(
            ValidationInvariant::DuplicateIdentifier,
            "SP_1.1 appears 2 times",
        ))
        .in_file("plate.csv")
        .in_file("other.csv");

        assert_eq!(
            err.to_string(),
            "plate.csv: validation failed [duplicate-identifier]: SP_1.1 appears 2 times"
        );
        assert_eq!(err.kind(), "validation");
        assert_eq!(
            err.lab_error().and_then(LabError::invariant),
            Some(ValidationInvariant::DuplicateIdentifier)
        );
    }
}
