//! Citation scrubbing
//!
//! Removes bracketed citation markup (`[report.pdf#page=3]`, `[source: x]`,
//! `[1]`, ...) from assistant text. The removal is driven by an ordered rule
//! table so new citation shapes can be added without touching the relay.

use once_cell::sync::Lazy;
use regex::Regex;

/// Broadest pass: any bracketed span without a nested closing bracket.
const BRACKET_SPAN: &str = r"\[[^\]]*\]";

/// Narrower case-insensitive patterns applied after the bracket pass, in order.
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("pdf_page", r"(?i)\[\s*[^\]]*\.pdf\s*#\s*page\s*=\s*\d+\s*[^\]]*\]"),
    ("file_extension", r"(?i)\[\s*[^\]]*\.(docx?|pdf|txt|xlsx?|csv)[^\]]*\]"),
    ("page_number", r"(?i)\[\s*[^\]]*\bpage\s*\d+\s*[^\]]*\]"),
    ("source", r"(?i)\[\s*[^\]]*\bsource\s*:?[^\]]*\]"),
    ("file_mention", r"(?i)\[\s*[^\]]*\b(file|document|reference)\s*[^\]]*\]"),
    ("empty", r"\[\s*\]"),
];

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static DEFAULT_SCRUBBER: Lazy<CitationScrubber> = Lazy::new(CitationScrubber::default);

/// A single named removal pattern
#[derive(Debug, Clone)]
pub struct CitationRule {
    name: String,
    pattern: Regex,
}

impl CitationRule {
    /// Compile a rule from a regular expression
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
        })
    }

    /// Rule name, used in debug output
    pub fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, "").into_owned()
    }
}

/// Ordered citation removal pipeline
///
/// The first rule is the broad bracket pass; the rest catch anything it
/// missed. After all rules run, whitespace runs collapse to one space and the
/// ends are trimmed.
#[derive(Debug, Clone)]
pub struct CitationScrubber {
    rules: Vec<CitationRule>,
}

impl Default for CitationScrubber {
    fn default() -> Self {
        let mut rules = Vec::with_capacity(DEFAULT_RULES.len() + 1);
        rules.push(
            CitationRule::new("bracket_span", BRACKET_SPAN).expect("bracket pattern is valid"),
        );
        for (name, pattern) in DEFAULT_RULES {
            rules.push(
                CitationRule::new(*name, pattern).expect("default citation pattern is valid"),
            );
        }
        Self { rules }
    }
}

impl CitationScrubber {
    /// Build a scrubber from an explicit rule table
    pub fn with_rules(rules: Vec<CitationRule>) -> Self {
        Self { rules }
    }

    /// Append a rule to the end of the table
    pub fn push_rule(&mut self, rule: CitationRule) {
        self.rules.push(rule);
    }

    /// The rules in application order
    pub fn rules(&self) -> &[CitationRule] {
        &self.rules
    }

    /// Remove citations, collapse whitespace and trim
    pub fn scrub(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let stripped = self
            .rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc));

        WHITESPACE.replace_all(&stripped, " ").trim().to_string()
    }

    /// Scrub one streamed fragment
    ///
    /// Same as [`scrub`](Self::scrub), except a single leading or trailing
    /// space survives when the fragment had surrounding whitespace, so
    /// consecutive fragments still join into separate words.
    pub fn scrub_fragment(&self, fragment: &str) -> String {
        if fragment.is_empty() {
            return String::new();
        }

        let leading = fragment.starts_with(char::is_whitespace);
        let trailing = fragment.ends_with(char::is_whitespace);
        let core = self.scrub(fragment);

        if core.is_empty() {
            return if leading || trailing {
                " ".to_string()
            } else {
                String::new()
            };
        }

        let mut out = String::with_capacity(core.len() + 2);
        if leading {
            out.push(' ');
        }
        out.push_str(&core);
        if trailing {
            out.push(' ');
        }
        out
    }
}

/// Scrub with the default rule table
pub fn scrub(text: &str) -> String {
    DEFAULT_SCRUBBER.scrub(text)
}

/// Scrub a streamed fragment with the default rule table
pub fn scrub_fragment(fragment: &str) -> String {
    DEFAULT_SCRUBBER.scrub_fragment(fragment)
}
