//! Shared data model for lab sample identifier processing.

pub mod enums;
pub mod error;
pub mod identifier;
pub mod lookup;
pub mod options;
pub mod table;

pub use enums::{DataType, MetricKind, TimeUnit};
pub use error::{LabError, Result, ValidationInvariant};
pub use identifier::{GroupAnimal, ParsedIdentifier, PlateFormat, UNKNOWN_CODE, WellPosition};
pub use lookup::{CaseInsensitiveSet, MetadataColumn, is_metadata_column};
pub use options::{
    Bounds, ClassifierPolicy, DEFAULT_MAX_NUMBER, ParseMode, ProcessingOptions, ReplicateMode,
    TissueDetection,
};
pub use table::{StructuredRow, StructuredTable};
