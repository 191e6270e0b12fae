//! Keyword matching over normalized transcripts.

use regex::Regex;

use crate::error::{Result, RoutingError};

// Characters that continue a word in a normalized transcript.
const WORD_CHARS: &str = r"a-z0-9'\-";

/// A keyword or multi-word phrase matched on whole-word boundaries.
///
/// `"kill switch"` matches `"hit the kill switch now"` and
/// `"kill  switch"`, but `"today"` does not match `"todays"`.
#[derive(Debug, Clone)]
pub struct KeywordPattern {
    keyword: String,
    regex: Regex,
}

impl KeywordPattern {
    /// Compiles a keyword. The keyword is lower-cased and matched literally.
    pub fn new(keyword: impl AsRef<str>) -> Result<Self> {
        let keyword = keyword.as_ref().trim().to_lowercase();
        let body = keyword
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        let pattern = format!(r"(?:^|[^{w}]){body}(?:$|[^{w}])", w = WORD_CHARS, body = body);
        let regex = Regex::new(&pattern).map_err(|source| RoutingError::InvalidPattern {
            pattern: keyword.clone(),
            source,
        })?;
        Ok(Self { keyword, regex })
    }

    /// Compiles a list of keywords.
    pub fn compile_all<I, S>(keywords: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keywords.into_iter().map(Self::new).collect()
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Checks whether the keyword occurs in already-normalized text.
    pub fn matches(&self, normalized: &str) -> bool {
        self.regex.is_match(normalized)
    }
}

/// Returns the first keyword from `patterns` present in `normalized`.
pub fn first_match<'a>(patterns: &'a [KeywordPattern], normalized: &str) -> Option<&'a str> {
    patterns
        .iter()
        .find(|p| p.matches(normalized))
        .map(|p| p.keyword())
}
