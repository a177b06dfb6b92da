//! Composite sample identifier parser.
//!
//! Runs the group/animal parser (required) followed by the optional field
//! parsers of the configured strategy, and memoizes the outcome per raw
//! identifier string. One parser instance belongs to one pipeline run; the
//! memo is not shared.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use lab_model::{
    LabError, ParsedIdentifier, PlateFormat, ProcessingOptions, Result, TissueDetection,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::field::{FieldKind, FieldOutcome, FieldParser, FieldParserVariant, FieldValue};
use crate::group_animal::{GroupAnimalParser, has_negative_encoding};
use crate::strategy::ParseStrategy;
use crate::time::TimeParser;
use crate::tissue::TissueParser;
use crate::well::WellParser;

/// File-extension suffixes removed before field parsing (case-insensitive).
pub const KNOWN_EXTENSIONS: &[&str] = &[".fcs"];

/// Residual text shorter than this is not worth reporting.
const RESIDUE_REPORT_MIN_LEN: usize = 3;

/// Why an identifier produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rejection {
    Empty,
    /// A `-N.` or `.-N` segment; never parsed as a positive pair.
    NegativeValue,
    MissingGroupAnimal,
}

impl Rejection {
    pub fn reason(self) -> &'static str {
        match self {
            Self::Empty => "empty sample identifier",
            Self::NegativeValue => "negative group/animal value",
            Self::MissingGroupAnimal => "no group/animal pair found",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Outcome of parsing one identifier.
pub type ParseOutcome = std::result::Result<ParsedIdentifier, Rejection>;

/// Full trace of one parse, used for diagnostics.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub identifier: String,
    /// Per-field outcomes in the order the parsers ran.
    pub outcomes: Vec<(FieldKind, FieldOutcome)>,
    /// Text no parser accounted for, joined with `_`.
    pub residue: Option<String>,
    pub result: ParseOutcome,
}

/// Parses sample identifiers into [`ParsedIdentifier`] values.
#[derive(Debug, Clone)]
pub struct SampleIdParser {
    strategy: ParseStrategy,
    group_animal: GroupAnimalParser,
    /// Optional field parsers in strategy order.
    fields: Vec<FieldParserVariant>,
    /// Code/name map used for display names, independent of the strategy.
    tissue_names: TissueParser,
    plate: PlateFormat,
    cache: HashMap<String, ParseOutcome>,
}

impl SampleIdParser {
    /// Builds a parser from processing options.
    ///
    /// Fails on an unknown strategy name, invalid bounds or an invalid
    /// extra tissue mapping.
    pub fn new(options: &ProcessingOptions) -> Result<Self> {
        options.bounds.validate()?;
        let mut strategy = ParseStrategy::from_name(&options.strategy)?;
        if options.tissue_detection == TissueDetection::Manual {
            strategy = strategy.without(FieldKind::Tissue);
        }

        let mut tissue_names = TissueParser::new();
        for (code, name) in &options.extra_tissues {
            tissue_names.add_mapping(code, name)?;
        }

        let mut parser = Self {
            strategy,
            group_animal: GroupAnimalParser::new(options.bounds),
            fields: Vec::new(),
            tissue_names,
            plate: options.plate_format,
            cache: HashMap::new(),
        };
        parser.rebuild_fields();
        Ok(parser)
    }

    /// Parser with a specific strategy and otherwise default options.
    pub fn with_strategy(strategy: ParseStrategy) -> Self {
        let mut parser = Self {
            strategy,
            group_animal: GroupAnimalParser::default(),
            fields: Vec::new(),
            tissue_names: TissueParser::new(),
            plate: PlateFormat::default(),
            cache: HashMap::new(),
        };
        parser.rebuild_fields();
        parser
    }

    pub fn strategy(&self) -> &ParseStrategy {
        &self.strategy
    }

    /// Lenient parse: `None` when the identifier cannot be decoded.
    pub fn parse(&mut self, identifier: &str) -> Option<ParsedIdentifier> {
        self.parse_outcome(identifier).ok()
    }

    /// Strict parse: a [`LabError::ParseFailure`] naming the identifier.
    pub fn try_parse(&mut self, identifier: &str) -> Result<ParsedIdentifier> {
        self.parse_outcome(identifier)
            .map_err(|rejection| LabError::ParseFailure {
                identifier: identifier.to_string(),
                row: None,
                reason: rejection.reason().to_string(),
            })
    }

    /// Memoized parse keyed by the raw identifier string.
    pub fn parse_outcome(&mut self, identifier: &str) -> ParseOutcome {
        if let Some(cached) = self.cache.get(identifier) {
            return cached.clone();
        }
        let report = self.run(identifier);
        if let Err(Rejection::NegativeValue) = report.result {
            warn!(identifier, "negative group/animal encoding rejected");
        }
        self.cache.insert(identifier.to_string(), report.result.clone());
        report.result
    }

    /// Uncached parse returning every field outcome and the residue.
    pub fn explain(&mut self, identifier: &str) -> ParseReport {
        self.run(identifier)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Registers a tissue mapping for decoding and display. Clears all memos.
    pub fn add_tissue(&mut self, code: &str, name: &str) -> Result<()> {
        self.tissue_names.add_mapping(code, name)?;
        self.rebuild_fields();
        self.cache.clear();
        Ok(())
    }

    /// Display name of a tissue code; unknown codes are returned unchanged.
    pub fn full_tissue_name(&self, code: &str) -> String {
        self.tissue_names.full_name(code)
    }

    pub fn tissues(&self) -> &TissueParser {
        &self.tissue_names
    }

    fn rebuild_fields(&mut self) {
        self.fields = self
            .strategy
            .kinds()
            .iter()
            .filter_map(|kind| match kind {
                FieldKind::GroupAnimal => None,
                FieldKind::Time => Some(FieldParserVariant::Time(TimeParser::new())),
                FieldKind::Tissue => Some(FieldParserVariant::Tissue(self.tissue_names.clone())),
                FieldKind::Well => Some(FieldParserVariant::Well(WellParser::new(self.plate))),
            })
            .collect();
    }

    fn run(&mut self, identifier: &str) -> ParseReport {
        let mut report = ParseReport {
            identifier: identifier.to_string(),
            outcomes: Vec::new(),
            residue: None,
            result: Err(Rejection::Empty),
        };

        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return report;
        }
        if has_negative_encoding(trimmed) {
            report.result = Err(Rejection::NegativeValue);
            return report;
        }
        let text = strip_extension(trimmed);

        let pair_outcome = self.group_animal.parse_field(text);
        let pair = match &pair_outcome {
            FieldOutcome::Matched {
                value: FieldValue::GroupAnimal(pair),
                ..
            } => *pair,
            FieldOutcome::Anomaly(_) => {
                report.outcomes.push((FieldKind::GroupAnimal, pair_outcome));
                report.result = Err(Rejection::NegativeValue);
                return report;
            }
            _ => {
                report.outcomes.push((FieldKind::GroupAnimal, pair_outcome));
                report.result = Err(Rejection::MissingGroupAnimal);
                return report;
            }
        };
        report.outcomes.push((FieldKind::GroupAnimal, pair_outcome));

        let mut parsed = ParsedIdentifier::new(pair);
        for field in &mut self.fields {
            let outcome = field.parse_field(text);
            if let FieldOutcome::Matched { value, .. } = &outcome {
                apply(&mut parsed, value);
            }
            report.outcomes.push((field.kind(), outcome));
        }

        let spans: Vec<Range<usize>> = report
            .outcomes
            .iter()
            .filter_map(|(_, outcome)| outcome.span())
            .collect();
        report.residue = residue(text, &spans);
        if let Some(residue) = report.residue.as_deref()
            && residue.len() >= RESIDUE_REPORT_MIN_LEN
        {
            debug!(identifier, residue, "unexplained text in sample identifier");
        }

        report.result = Ok(parsed);
        report
    }
}

fn apply(parsed: &mut ParsedIdentifier, value: &FieldValue) {
    match value {
        FieldValue::GroupAnimal(pair) => {
            parsed.group = pair.group;
            parsed.animal = pair.animal;
        }
        FieldValue::TimeHours(hours) => parsed.time_hours = Some(*hours),
        FieldValue::Tissue(code) => parsed.tissue = code.clone(),
        FieldValue::Well(well) => parsed.well = well.code(),
    }
}

/// Removes one known extension suffix, if present.
pub fn strip_extension(text: &str) -> &str {
    for extension in KNOWN_EXTENSIONS {
        let split = text.len().saturating_sub(extension.len());
        if text.is_char_boundary(split) && text[split..].eq_ignore_ascii_case(extension) {
            return &text[..split];
        }
    }
    text
}

/// Tokens of `text` outside every matched span.
fn residue(text: &str, spans: &[Range<usize>]) -> Option<String> {
    let blanked: String = text
        .char_indices()
        .map(|(index, ch)| {
            if spans.iter().any(|span| span.contains(&index)) {
                ' '
            } else {
                ch
            }
        })
        .collect();
    let tokens: Vec<&str> = blanked
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect();
    (!tokens.is_empty()).then(|| tokens.join("_"))
}
