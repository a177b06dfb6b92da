//! Group/animal pair decoding.
//!
//! Matchers are tried in order and the first in-bounds pair wins:
//!
//! 1. `dotted` – `1.2`, the usual cytometer export form
//! 2. `g-a` – `G1A2`
//! 3. `group-animal words` – `Group 1 ... Animal 2`
//! 4. `underscore pair` – `1_2`
//!
//! Negative encodings such as `SP_-1.2` or `SP_1.-2` are reported as an
//! anomaly before any matcher runs.

use std::ops::Range;
use std::sync::LazyLock;

use lab_model::{Bounds, GroupAnimal};
use regex::Regex;

use crate::field::{FieldKind, FieldOutcome, FieldParser, FieldValue};
use crate::matcher::PatternMatcher;

static NEGATIVE_ENCODING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|_)-\d+\.|\.-\d+").expect("Invalid negative encoding regex"));

static GROUP_ANIMAL_MATCHERS: LazyLock<Vec<GroupAnimalMatcher>> = LazyLock::new(|| {
    vec![
        GroupAnimalMatcher(PatternMatcher::compile(
            "dotted",
            r"(?:^|[^\d.])(?P<group>\d+)\.(?P<animal>\d+)(?:$|[^\d.A-Za-z]|\.[A-Za-z])",
        )),
        GroupAnimalMatcher(PatternMatcher::compile(
            "g-a",
            r"(?i)G(?P<group>\d+)A(?P<animal>\d+)",
        )),
        GroupAnimalMatcher(PatternMatcher::compile(
            "group-animal words",
            r"(?i)group\s*(?P<group>\d+).*?animal\s*(?P<animal>\d+)",
        )),
        GroupAnimalMatcher(PatternMatcher::compile(
            "underscore pair",
            r"(?:^|[^\d.])(?P<group>\d+)_(?P<animal>\d+)(?:$|[^\d.])",
        )),
    ]
});

/// Whether the text encodes a negative group or animal number.
pub fn has_negative_encoding(text: &str) -> bool {
    NEGATIVE_ENCODING.is_match(text)
}

/// Ordered matcher list, exposed for inspection and isolated testing.
pub fn group_animal_matchers() -> &'static [GroupAnimalMatcher] {
    &GROUP_ANIMAL_MATCHERS
}

/// One group/animal pattern.
#[derive(Debug, Clone)]
pub struct GroupAnimalMatcher(PatternMatcher);

impl GroupAnimalMatcher {
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// First pair found by this matcher with both numbers inside `bounds`.
    pub fn find(&self, text: &str, bounds: Bounds) -> Option<(GroupAnimal, Range<usize>)> {
        for caps in self.0.captures_iter(text) {
            let (Some(group), Some(animal)) = (caps.name("group"), caps.name("animal")) else {
                continue;
            };
            let (Ok(group_number), Ok(animal_number)) =
                (group.as_str().parse::<u32>(), animal.as_str().parse::<u32>())
            else {
                continue;
            };
            if bounds.contains(group_number) && bounds.contains(animal_number) {
                return Some((
                    GroupAnimal::new(group_number, animal_number),
                    group.start()..animal.end(),
                ));
            }
        }
        None
    }
}

/// Decodes the group/animal pair of an identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupAnimalParser {
    bounds: Bounds,
}

impl GroupAnimalParser {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn parse(&self, text: &str) -> Option<GroupAnimal> {
        self.find(text).map(|(pair, _)| pair)
    }

    /// Pair and byte span of the first matcher that succeeds.
    pub fn find(&self, text: &str) -> Option<(GroupAnimal, Range<usize>)> {
        if text.trim().is_empty() || has_negative_encoding(text) {
            return None;
        }
        group_animal_matchers()
            .iter()
            .find_map(|matcher| matcher.find(text, self.bounds))
    }
}

impl FieldParser for GroupAnimalParser {
    fn kind(&self) -> FieldKind {
        FieldKind::GroupAnimal
    }

    fn parse_field(&mut self, text: &str) -> FieldOutcome {
        if has_negative_encoding(text) {
            return FieldOutcome::Anomaly("negative group/animal encoding".to_string());
        }
        match self.find(text) {
            Some((pair, span)) => FieldOutcome::Matched {
                value: FieldValue::GroupAnimal(pair),
                span,
            },
            None => FieldOutcome::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Option<(u32, u32)> {
        GroupAnimalParser::default()
            .parse(text)
            .map(|pair| (pair.group, pair.animal))
    }

    #[test]
    fn dotted_pairs() {
        assert_eq!(parse("1.1"), Some((1, 1)));
        assert_eq!(parse("10.15"), Some((10, 15)));
        assert_eq!(parse("SP_A1_1.1"), Some((1, 1)));
        assert_eq!(parse("Specimen_001_2.3.fcs"), Some((2, 3)));
    }

    #[test]
    fn time_decimal_is_not_taken_as_pair() {
        assert_eq!(parse("2.5h_SP_1.3"), Some((1, 3)));
    }

    #[test]
    fn fallback_forms() {
        assert_eq!(parse("SP_G2A7"), Some((2, 7)));
        assert_eq!(parse("Group 3 - Animal 4"), Some((3, 4)));
        assert_eq!(parse("LN_4_9"), Some((4, 9)));
    }

    #[test]
    fn rejects_malformed() {
        for text in ["", "invalid", "SP_1.", "SP_.1", "SP_-1.1", "SP_1.-1"] {
            assert_eq!(parse(text), None, "{text}");
        }
    }

    #[test]
    fn out_of_bounds_falls_through() {
        let parser = GroupAnimalParser::new(Bounds { min: 1, max: 9 });
        assert_eq!(parser.parse("12.3"), None);
        assert_eq!(
            parser.parse("12.3_G4A5").map(|pair| (pair.group, pair.animal)),
            Some((4, 5))
        );
    }

    #[test]
    fn negative_encoding_is_an_anomaly() {
        let mut parser = GroupAnimalParser::default();
        assert!(matches!(
            parser.parse_field("SP_-1.2"),
            FieldOutcome::Anomaly(_)
        ));
        assert!(matches!(
            parser.parse_field("SP_1.-2"),
            FieldOutcome::Anomaly(_)
        ));
    }

    #[test]
    fn each_matcher_in_isolation() {
        let names: Vec<&str> = group_animal_matchers().iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            vec!["dotted", "g-a", "group-animal words", "underscore pair"]
        );
        let bounds = Bounds::default();
        let matchers = group_animal_matchers();
        assert!(matchers[0].find("x_1.2", bounds).is_some());
        assert!(matchers[0].find("G1A2", bounds).is_none());
        assert!(matchers[1].find("g1a2", bounds).is_some());
        assert!(matchers[2].find("group1_animal2", bounds).is_some());
        assert_eq!(
            matchers[3].find("BM_3_4", bounds).map(|(_, span)| span),
            Some(3..6)
        );
    }
}
