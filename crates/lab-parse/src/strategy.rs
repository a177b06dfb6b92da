//! Parse strategies: named, ordered lists of field parser kinds.

use lab_model::{LabError, Result};
use serde::{Deserialize, Serialize};

use crate::field::FieldKind;

const DEFAULT_KINDS: &[FieldKind] = &[
    FieldKind::GroupAnimal,
    FieldKind::Well,
    FieldKind::Tissue,
    FieldKind::Time,
];

const MINIMAL_KINDS: &[FieldKind] = &[FieldKind::GroupAnimal, FieldKind::Time];

/// Registered strategy names. `flow` is an alias of `default`.
const STRATEGY_NAMES: &[&str] = &["default", "flow", "minimal"];

/// Which field parsers run, and in which order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStrategy {
    name: String,
    kinds: Vec<FieldKind>,
}

impl Default for ParseStrategy {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            kinds: DEFAULT_KINDS.to_vec(),
        }
    }
}

impl ParseStrategy {
    /// Looks up a registered strategy by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" | "flow" => Ok(Self::default()),
            "minimal" => Ok(Self {
                name: "minimal".to_string(),
                kinds: MINIMAL_KINDS.to_vec(),
            }),
            other => Err(LabError::configuration(format!(
                "unknown parsing strategy '{other}' (available: {})",
                STRATEGY_NAMES.join(", ")
            ))),
        }
    }

    /// Builds a strategy from an explicit list.
    ///
    /// The list must contain the group/animal parser exactly once and no
    /// repeated kinds.
    pub fn custom(name: impl Into<String>, kinds: Vec<FieldKind>) -> Result<Self> {
        let name = name.into();
        if !kinds.contains(&FieldKind::GroupAnimal) {
            return Err(LabError::configuration(format!(
                "strategy '{name}' must include the group-animal parser"
            )));
        }
        for (index, kind) in kinds.iter().enumerate() {
            if kinds[..index].contains(kind) {
                return Err(LabError::configuration(format!(
                    "strategy '{name}' lists the {kind} parser twice"
                )));
            }
        }
        Ok(Self { name, kinds })
    }

    pub fn available() -> &'static [&'static str] {
        STRATEGY_NAMES
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kinds(&self) -> &[FieldKind] {
        &self.kinds
    }

    pub fn contains(&self, kind: FieldKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Same strategy with one optional parser removed.
    #[must_use]
    pub fn without(mut self, kind: FieldKind) -> Self {
        if kind != FieldKind::GroupAnimal {
            self.kinds.retain(|existing| *existing != kind);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_strategies() {
        let default = ParseStrategy::from_name("Default").unwrap();
        assert_eq!(default.kinds(), DEFAULT_KINDS);
        assert_eq!(ParseStrategy::from_name("flow").unwrap(), default);

        let minimal = ParseStrategy::from_name("minimal").unwrap();
        assert!(!minimal.contains(FieldKind::Tissue));
    }

    #[test]
    fn unknown_name_is_configuration_failure() {
        let err = ParseStrategy::from_name("fancy").unwrap_err();
        assert!(matches!(err, LabError::ConfigurationFailure { .. }));
        assert!(err.to_string().contains("minimal"));
    }

    #[test]
    fn custom_requires_group_animal_once() {
        assert!(ParseStrategy::custom("t", vec![FieldKind::Time]).is_err());
        assert!(
            ParseStrategy::custom("t", vec![FieldKind::GroupAnimal, FieldKind::Time, FieldKind::Time])
                .is_err()
        );
        let custom =
            ParseStrategy::custom("t", vec![FieldKind::Time, FieldKind::GroupAnimal]).unwrap();
        assert_eq!(custom.name(), "t");
    }

    #[test]
    fn without_keeps_group_animal() {
        let strategy = ParseStrategy::default()
            .without(FieldKind::Tissue)
            .without(FieldKind::GroupAnimal);
        assert_eq!(
            strategy.kinds(),
            &[FieldKind::GroupAnimal, FieldKind::Well, FieldKind::Time]
        );
    }
}
