//! Configuration options for identifier parsing and table processing.
//!
//! Options are always passed in by the caller; nothing here reads from disk.

use serde::{Deserialize, Serialize};

use crate::enums::TimeUnit;
use crate::error::{LabError, Result};
use crate::identifier::PlateFormat;

/// Default upper bound for group and animal numbers.
pub const DEFAULT_MAX_NUMBER: u32 = 999_999;

/// Inclusive bounds applied to decoded group and animal numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: 1,
            max: DEFAULT_MAX_NUMBER,
        }
    }
}

impl Bounds {
    pub fn new(min: u32, max: u32) -> Result<Self> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn contains(self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Group and animal numbers are positive, so the lower bound must be at least 1.
    pub fn validate(self) -> Result<()> {
        if self.min == 0 {
            return Err(LabError::configuration(
                "group/animal lower bound must be at least 1",
            ));
        }
        if self.min > self.max {
            return Err(LabError::configuration(format!(
                "group/animal bounds are inverted: min {} > max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// How unparseable identifiers are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParseMode {
    /// Unparseable rows are dropped and counted.
    #[default]
    Lenient,
    /// The first unparseable identifier aborts the table.
    Strict,
}

/// How replicate indices are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReplicateMode {
    /// Replicate count follows the largest partition.
    #[default]
    Auto,
    /// Groups and replicates come from explicit override lists.
    Manual,
}

/// Where tissue codes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TissueDetection {
    /// Decode tissue from each sample identifier.
    #[default]
    Auto,
    /// Use an existing `Tissue` column verbatim, or the unknown code.
    Manual,
}

/// Trigger signals used by the data-type classifier.
///
/// Patterns are regular expressions matched case-insensitively unless noted.
/// Fields missing from a serialized policy keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierPolicy {
    /// File-extension markers searched in headers and identifier values.
    pub extension_patterns: Vec<String>,
    /// Population-path separators and cytometer statistic tokens in headers.
    pub header_patterns: Vec<String>,
    /// Tissue prefixes (literal, case-sensitive) in headers or sampled values.
    pub tissue_prefixes: Vec<String>,
    /// Well-coordinate patterns (case-sensitive) in headers or sampled values.
    pub well_patterns: Vec<String>,
    /// Patterns checked in the identifier column only.
    pub identifier_value_patterns: Vec<String>,
    /// First-column names treated as an identifier column.
    pub identifier_column_names: Vec<String>,
    /// Number of leading rows sampled for value checks.
    pub sample_rows: usize,
    /// Characters in column names that rule out a generic lab table.
    pub complex_name_separators: Vec<char>,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            extension_patterns: vec![r"\.fcs".to_string()],
            header_patterns: vec![
                r"\|".to_string(),
                r"freq\.?\s+of\s+parent".to_string(),
                r"freq\.?\s+of\s+live".to_string(),
                r"freq\.?\s+of\s+total".to_string(),
                r"median\s+\(comp-".to_string(),
                r"mean\s+\(comp-".to_string(),
            ],
            tissue_prefixes: ["SP_", "BM_", "PB_", "LN_", "TH_", "LI_", "KI_", "LU_", "BR_", "HE_"]
                .into_iter()
                .map(String::from)
                .collect(),
            well_patterns: vec![
                r"_[A-H]\d{1,2}_".to_string(),
                r"_[A-H]\d{1,2}\b".to_string(),
            ],
            identifier_value_patterns: vec![r"\d+\.\d+".to_string()],
            identifier_column_names: vec![
                String::new(),
                "unnamed: 0".to_string(),
                "sampleid".to_string(),
                "sample id".to_string(),
            ],
            sample_rows: 20,
            complex_name_separators: vec!['|', '/'],
        }
    }
}

/// Options controlling a processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    /// Name of the field-parser strategy (`default`, `minimal`).
    pub strategy: String,
    pub bounds: Bounds,
    pub plate_format: PlateFormat,
    /// Unit assumed for bare numeric timepoints in generic lab tables.
    pub default_time_unit: TimeUnit,
    pub parse_mode: ParseMode,
    pub replicate_mode: ReplicateMode,
    /// Explicit group list; restricts and orders replicate mapping.
    pub groups: Option<Vec<i64>>,
    /// Explicit replicate list; its length fixes the replicate count.
    pub replicates: Option<Vec<u32>>,
    pub tissue_detection: TissueDetection,
    /// Additional tissue code/name pairs registered before parsing.
    pub extra_tissues: Vec<(String, String)>,
    pub classifier: ClassifierPolicy,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            strategy: "default".to_string(),
            bounds: Bounds::default(),
            plate_format: PlateFormat::default(),
            default_time_unit: TimeUnit::Hours,
            parse_mode: ParseMode::default(),
            replicate_mode: ReplicateMode::default(),
            groups: None,
            replicates: None,
            tissue_detection: TissueDetection::default(),
            extra_tissues: Vec::new(),
            classifier: ClassifierPolicy::default(),
        }
    }
}

impl ProcessingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that fail on the first unparseable identifier.
    pub fn strict() -> Self {
        Self {
            parse_mode: ParseMode::Strict,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy = name.into();
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    #[must_use]
    pub fn with_plate_format(mut self, plate: PlateFormat) -> Self {
        self.plate_format = plate;
        self
    }

    #[must_use]
    pub fn with_default_time_unit(mut self, unit: TimeUnit) -> Self {
        self.default_time_unit = unit;
        self
    }

    #[must_use]
    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    #[must_use]
    pub fn with_manual_replicates(mut self, groups: Vec<i64>, replicates: Vec<u32>) -> Self {
        self.replicate_mode = ReplicateMode::Manual;
        self.groups = Some(groups);
        self.replicates = Some(replicates);
        self
    }

    #[must_use]
    pub fn with_groups(mut self, groups: Vec<i64>) -> Self {
        self.groups = Some(groups);
        self
    }

    #[must_use]
    pub fn with_tissue_detection(mut self, detection: TissueDetection) -> Self {
        self.tissue_detection = detection;
        self
    }

    #[must_use]
    pub fn with_extra_tissue(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.extra_tissues.push((code.into(), name.into()));
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, policy: ClassifierPolicy) -> Self {
        self.classifier = policy;
        self
    }

    /// Checks option combinations that do not depend on the input table.
    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        if self.replicate_mode == ReplicateMode::Manual {
            let groups_missing = self.groups.as_ref().is_none_or(Vec::is_empty);
            let replicates_missing = self.replicates.as_ref().is_none_or(Vec::is_empty);
            if groups_missing || replicates_missing {
                return Err(LabError::configuration(
                    "manual replicate mode requires both group and replicate lists",
                ));
            }
        }
        for (code, name) in &self.extra_tissues {
            if code.trim().is_empty() || name.trim().is_empty() {
                return Err(LabError::configuration(format!(
                    "tissue mapping '{code}' -> '{name}' has an empty side"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_cover_positive_range() {
        let bounds = Bounds::default();
        assert!(bounds.contains(1));
        assert!(bounds.contains(DEFAULT_MAX_NUMBER));
        assert!(!bounds.contains(0));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert!(matches!(
            Bounds::new(10, 2),
            Err(LabError::ConfigurationFailure { .. })
        ));
        assert!(Bounds::new(0, 5).is_err());
    }

    #[test]
    fn manual_mode_requires_both_lists() {
        let mut options = ProcessingOptions::default();
        options.replicate_mode = ReplicateMode::Manual;
        options.groups = Some(vec![1, 2]);
        assert!(options.validate().is_err());

        let options = ProcessingOptions::default().with_manual_replicates(vec![1, 2], vec![1, 2, 3]);
        assert!(options.validate().is_ok());
    }
}
