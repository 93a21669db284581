//! Line grammar and classification.
//!
//! Classification tries the structured shapes in a fixed priority order
//! (Check, Testing, Tag) and falls back to Plain, which matches any string.
//! An optional transport prefix pattern (for multiplexed streams that tag
//! every line) may be prepended to the structured patterns; a captured
//! prefix is preserved verbatim when the line is re-rendered.

use std::fmt;

use regex::Regex;
use thiserror::Error;

/// The result token that marks a passing check. Any other non-empty token
/// is a failure.
pub const RESULT_OK: &str = "ok";

/// The result token used for synthesized failure checks.
pub const RESULT_FAILED: &str = "FAILED";

// ---------------------------------------------------------------------------
// Line shapes
// ---------------------------------------------------------------------------

/// `Testing "<title>" in <location>:` opens a test section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestingLine {
    pub prefix: String,
    pub title: String,
    pub location: String,
}

impl TestingLine {
    #[must_use]
    pub fn new(title: &str, location: &str) -> Self {
        Self {
            prefix: String::new(),
            title: title.to_string(),
            location: location.to_string(),
        }
    }

    /// The one-line outcome synthesized for this section when it closes.
    #[must_use]
    pub fn outcome(&self, result: &str) -> CheckLine {
        CheckLine::new(&format!("{}  {}", self.location, self.title), result)
    }
}

impl fmt::Display for TestingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Testing \"{}\" in {}:",
            self.prefix, self.title, self.location
        )
    }
}

/// `! <text> <result>`, a single pass/fail check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckLine {
    pub prefix: String,
    pub text: String,
    pub result: String,
}

impl CheckLine {
    #[must_use]
    pub fn new(text: &str, result: &str) -> Self {
        Self {
            prefix: String::new(),
            text: text.to_string(),
            result: result.to_string(),
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.result == RESULT_OK
    }
}

impl fmt::Display for CheckLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}! {} {}", self.prefix, self.text, self.result)
    }
}

/// `wvtest: <tag>`, an out-of-band annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLine {
    pub prefix: String,
    pub tag: String,
}

impl fmt::Display for TagLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}wvtest: {}", self.prefix, self.tag)
    }
}

/// A single classified line of WvTest output.
///
/// Exactly one variant matches any input line; [`Line::Plain`] is the total
/// fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Plain(String),
    Testing(TestingLine),
    Check(CheckLine),
    Tag(TagLine),
}

impl Line {
    /// Stable slug for serialization and tests.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Plain(_) => "plain",
            Self::Testing(_) => "testing",
            Self::Check(_) => "check",
            Self::Tag(_) => "tag",
        }
    }

    /// A blank line: plain with no content. Blank lines neither promote nor
    /// discard a pending implicit section title.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Plain(text) if text.is_empty())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(text) => f.write_str(text),
            Self::Testing(line) => fmt::Display::fmt(line, f),
            Self::Check(line) => fmt::Display::fmt(line, f),
            Self::Tag(line) => fmt::Display::fmt(line, f),
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// The configured line-prefix pattern did not compile as a regex.
#[derive(Debug, Error)]
#[error("invalid line prefix pattern {pattern:?}: {source}")]
pub struct PrefixPatternError {
    pattern: String,
    #[source]
    source: regex::Error,
}

/// Classifies raw lines against the WvTest grammar.
///
/// Priority is fixed: Check, Testing, Tag, Plain. Plain matches anything,
/// including the empty string, so classification never fails.
pub struct Classifier {
    check: Regex,
    testing: Regex,
    tag: Regex,
}

impl Classifier {
    #[must_use]
    pub fn new() -> Self {
        match Self::with_prefix("") {
            Ok(classifier) => classifier,
            // The empty-prefix patterns are fixed; failing to compile them
            // is a programming error, not a runtime condition.
            Err(err) => panic!("built-in line patterns failed to compile: {err}"),
        }
    }

    /// Build a classifier that tolerates `pattern` (a regex) before each
    /// structured line shape.
    pub fn with_prefix(pattern: &str) -> Result<Self, PrefixPatternError> {
        let compile = |body: &str| -> Result<Regex, PrefixPatternError> {
            Regex::new(&format!("^(?P<prefix>{pattern}){body}$")).map_err(|source| {
                PrefixPatternError {
                    pattern: pattern.to_string(),
                    source,
                }
            })
        };
        Ok(Self {
            check: compile(r"!\s*(?P<text>.*?)\s+(?P<result>\S+)")?,
            testing: compile(r#"Testing "(?P<title>.*)" in (?P<location>.*):"#)?,
            tag: compile(r"wvtest:\s*(?P<tag>.*)")?,
        })
    }

    /// Classify one raw line. Trailing line-ending characters are stripped
    /// before matching.
    #[must_use]
    pub fn classify(&self, raw: &str) -> Line {
        let line = raw.trim_end_matches(['\r', '\n']);

        if let Some(cap) = self.check.captures(line) {
            return Line::Check(CheckLine {
                prefix: group(&cap, "prefix"),
                text: group(&cap, "text"),
                result: group(&cap, "result"),
            });
        }
        if let Some(cap) = self.testing.captures(line) {
            return Line::Testing(TestingLine {
                prefix: group(&cap, "prefix"),
                title: group(&cap, "title"),
                location: group(&cap, "location"),
            });
        }
        if let Some(cap) = self.tag.captures(line) {
            return Line::Tag(TagLine {
                prefix: group(&cap, "prefix"),
                tag: group(&cap, "tag"),
            });
        }
        Line::Plain(line.to_string())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

fn group(cap: &regex::Captures<'_>, name: &str) -> String {
    cap.name(name).map_or(String::new(), |m| m.as_str().to_string())
}
