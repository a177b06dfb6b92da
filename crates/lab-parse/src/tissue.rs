//! Tissue code decoding with a runtime-extensible code/name map.
//!
//! Lookup order for one identifier:
//!
//! 1. an alphanumeric token equal to a known code (`SP_1.1` -> `SP`)
//! 2. the whole text equal to a full name (`spleen`)
//! 3. a full name contained in the text (`Whole Blood_B1_1.1`)
//! 4. a multi-word name with tolerant separators (`bone_marrow`, `LymphNode`)
//!
//! Results are memoized per text. Registering a mapping clears the memo.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use lab_model::{LabError, Result};
use regex::Regex;

use crate::field::{FieldKind, FieldOutcome, FieldParser, FieldValue};

const DEFAULT_TISSUES: &[(&str, &str)] = &[
    ("SP", "Spleen"),
    ("BM", "Bone Marrow"),
    ("WB", "Whole Blood"),
    ("PB", "Peripheral Blood"),
    ("LN", "Lymph Node"),
    ("TH", "Thymus"),
    ("LI", "Liver"),
    ("LU", "Lung"),
    ("KD", "Kidney"),
    ("BR", "Brain"),
    ("HE", "Heart"),
    ("SK", "Skin"),
    ("MU", "Muscle"),
    ("AD", "Adipose"),
    ("PA", "Pancreas"),
    ("IN", "Intestine"),
];

/// A resolved tissue code and the text that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TissueMatch {
    pub code: String,
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
struct NamePattern {
    code: String,
    regex: Regex,
}

/// Decodes tissue codes and maps them to full names.
#[derive(Debug, Clone)]
pub struct TissueParser {
    code_to_name: BTreeMap<String, String>,
    /// Lowercase full name to code.
    name_to_code: HashMap<String, String>,
    /// Lowercase names, longest first, for substring search.
    names_by_length: Vec<String>,
    patterns: Vec<NamePattern>,
    cache: HashMap<String, Option<TissueMatch>>,
}

impl Default for TissueParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TissueParser {
    pub fn new() -> Self {
        let mut parser = Self {
            code_to_name: BTreeMap::new(),
            name_to_code: HashMap::new(),
            names_by_length: Vec::new(),
            patterns: Vec::new(),
            cache: HashMap::new(),
        };
        for (code, name) in DEFAULT_TISSUES {
            parser.insert(code, name);
        }
        parser.rebuild_indexes();
        parser
    }

    /// Registers or replaces a code/name pair.
    pub fn add_mapping(&mut self, code: &str, name: &str) -> Result<()> {
        let code = code.trim();
        let name = name.trim();
        if code.is_empty() || name.is_empty() {
            return Err(LabError::configuration(format!(
                "tissue mapping needs a code and a name, got '{code}' -> '{name}'"
            )));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LabError::configuration(format!(
                "tissue code '{code}' must be alphanumeric"
            )));
        }
        self.insert(code, name);
        self.rebuild_indexes();
        self.cache.clear();
        Ok(())
    }

    /// Full name for a code; unknown codes are returned unchanged.
    pub fn full_name(&self, code: &str) -> String {
        self.code_to_name
            .get(&code.trim().to_ascii_uppercase())
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.name_to_code
            .get(&name.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn known_codes(&self) -> impl Iterator<Item = &str> {
        self.code_to_name.keys().map(String::as_str)
    }

    pub fn is_known_code(&self, code: &str) -> bool {
        self.code_to_name.contains_key(&code.trim().to_ascii_uppercase())
    }

    pub fn parse(&mut self, text: &str) -> Option<String> {
        self.find(text).map(|found| found.code)
    }

    /// Memoized lookup.
    pub fn find(&mut self, text: &str) -> Option<TissueMatch> {
        if let Some(cached) = self.cache.get(text) {
            return cached.clone();
        }
        let found = self.lookup(text);
        self.cache.insert(text.to_string(), found.clone());
        found
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn lookup(&self, text: &str) -> Option<TissueMatch> {
        if text.trim().is_empty() {
            return None;
        }
        self.match_code_token(text)
            .or_else(|| self.match_exact_name(text))
            .or_else(|| self.match_name_substring(text))
            .or_else(|| self.match_name_pattern(text))
    }

    fn match_code_token(&self, text: &str) -> Option<TissueMatch> {
        alphanumeric_tokens(text).find_map(|span| {
            let token = text[span.clone()].to_ascii_uppercase();
            self.code_to_name
                .contains_key(&token)
                .then_some(TissueMatch { code: token, span })
        })
    }

    fn match_exact_name(&self, text: &str) -> Option<TissueMatch> {
        let trimmed = text.trim();
        let code = self.name_to_code.get(&trimmed.to_ascii_lowercase())?;
        let start = text.len() - text.trim_start().len();
        Some(TissueMatch {
            code: code.clone(),
            span: start..start + trimmed.len(),
        })
    }

    fn match_name_substring(&self, text: &str) -> Option<TissueMatch> {
        // ASCII lowercasing keeps byte offsets valid for the original text.
        let lowered = text.to_ascii_lowercase();
        self.names_by_length.iter().find_map(|name| {
            let start = lowered.find(name.as_str())?;
            Some(TissueMatch {
                code: self.name_to_code.get(name)?.clone(),
                span: start..start + name.len(),
            })
        })
    }

    fn match_name_pattern(&self, text: &str) -> Option<TissueMatch> {
        self.patterns.iter().find_map(|pattern| {
            let caps = pattern.regex.captures(text)?;
            let name = caps.name("name")?;
            Some(TissueMatch {
                code: pattern.code.clone(),
                span: name.range(),
            })
        })
    }

    fn insert(&mut self, code: &str, name: &str) {
        let code = code.to_ascii_uppercase();
        if let Some(previous) = self.code_to_name.insert(code.clone(), name.to_string()) {
            self.name_to_code.remove(&previous.to_ascii_lowercase());
        }
        self.name_to_code.insert(name.to_ascii_lowercase(), code);
    }

    fn rebuild_indexes(&mut self) {
        let mut names: Vec<String> = self.name_to_code.keys().cloned().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self.names_by_length = names;

        self.patterns = self
            .code_to_name
            .iter()
            .filter_map(|(code, name)| {
                let words: Vec<String> = name.split_whitespace().map(regex::escape).collect();
                if words.len() < 2 {
                    return None;
                }
                let pattern = format!(
                    r"(?i)(?:^|[^a-z])(?P<name>{})(?:[^a-z]|$)",
                    words.join(r"[\s_\-]*")
                );
                let regex = Regex::new(&pattern).ok()?;
                Some(NamePattern {
                    code: code.clone(),
                    regex,
                })
            })
            .collect();
    }
}

/// Byte ranges of maximal ASCII-alphanumeric runs.
fn alphanumeric_tokens(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut start = None;
    let mut spans = Vec::new();
    for (index, ch) in text.char_indices() {
        match (ch.is_ascii_alphanumeric(), start) {
            (true, None) => start = Some(index),
            (false, Some(begin)) => {
                spans.push(begin..index);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        spans.push(begin..text.len());
    }
    spans.into_iter()
}

impl FieldParser for TissueParser {
    fn kind(&self) -> FieldKind {
        FieldKind::Tissue
    }

    fn parse_field(&mut self, text: &str) -> FieldOutcome {
        match self.find(text) {
            Some(found) => FieldOutcome::Matched {
                value: FieldValue::Tissue(found.code),
                span: found.span,
            },
            None => FieldOutcome::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_token_wins() {
        let mut parser = TissueParser::new();
        assert_eq!(parser.parse("SP_1.1_2hour").as_deref(), Some("SP"));
        assert_eq!(parser.parse("2h_bm_A1_1.1").as_deref(), Some("BM"));
        assert_eq!(parser.parse("Specimen_001_1.1").as_deref(), None);
    }

    #[test]
    fn full_names_and_patterns() {
        let mut parser = TissueParser::new();
        assert_eq!(parser.parse("spleen").as_deref(), Some("SP"));
        assert_eq!(parser.parse("Whole Blood_B1_1.1").as_deref(), Some("WB"));
        assert_eq!(parser.parse("bone_marrow_2.1").as_deref(), Some("BM"));
        assert_eq!(parser.parse("LymphNode 3.1").as_deref(), Some("LN"));
    }

    #[test]
    fn name_span_points_at_source_text() {
        let mut parser = TissueParser::new();
        let text = "x_Peripheral Blood_1.1";
        let found = parser.find(text).unwrap();
        assert_eq!(&text[found.span], "Peripheral Blood");
    }

    #[test]
    fn full_name_round_trip() {
        let parser = TissueParser::new();
        assert_eq!(parser.full_name("SP"), "Spleen");
        assert_eq!(parser.full_name("sp"), "Spleen");
        assert_eq!(parser.full_name("ZZ"), "ZZ");
        assert_eq!(parser.code_for_name("Lymph Node"), Some("LN"));
        assert_eq!(parser.known_codes().count(), DEFAULT_TISSUES.len());
    }

    #[test]
    fn add_mapping_invalidates_cache() {
        let mut parser = TissueParser::new();
        assert_eq!(parser.parse("TU_1.1"), None);
        assert_eq!(parser.cache_len(), 1);

        parser.add_mapping("tu", "Tumor").unwrap();
        assert_eq!(parser.cache_len(), 0);
        assert_eq!(parser.parse("TU_1.1").as_deref(), Some("TU"));
        assert_eq!(parser.parse("tumor 1.1").as_deref(), Some("TU"));
        assert_eq!(parser.full_name("TU"), "Tumor");
    }

    #[test]
    fn rejects_empty_mapping() {
        let mut parser = TissueParser::new();
        assert!(parser.add_mapping("", "Tumor").is_err());
        assert!(parser.add_mapping("TU", " ").is_err());
        assert!(parser.add_mapping("T-U", "Tumor").is_err());
    }
}
