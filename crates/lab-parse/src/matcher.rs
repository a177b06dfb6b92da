//! Named regex matchers used to build ordered fallback lists.

use regex::{CaptureMatches, Regex};

/// A compiled pattern with a stable name for diagnostics.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    name: &'static str,
    regex: Regex,
}

impl PatternMatcher {
    /// Compiles a built-in pattern. Only called with constant patterns.
    pub(crate) fn compile(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("built-in matcher pattern must compile"),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub(crate) fn captures_iter<'r, 'h>(&'r self, text: &'h str) -> CaptureMatches<'r, 'h> {
        self.regex.captures_iter(text)
    }
}
