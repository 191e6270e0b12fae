//! Transcript normalization and wake-word candidate extraction.

use std::fmt;
use std::sync::OnceLock;

use crate::patterns::{first_match, KeywordPattern};

/// Commands understood regardless of which agent is addressed.
pub const UNIVERSAL_COMMANDS: &[&str] = &[
    "new session",
    "start session",
    "help",
    "user guide",
    "accessibility",
    "exit",
    "quit",
];

/// A cleaned, lower-cased transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTranscript {
    text: String,
}

/// Normalizes a raw transcript.
///
/// Lower-cases, maps typographic apostrophes to `'`, replaces anything other
/// than letters, digits, whitespace, `'`, `-` and `,` with a space, and
/// collapses whitespace.
pub fn normalize(transcript: &str) -> NormalizedTranscript {
    let mapped: String = transcript
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{02BC}' | '`' | '\u{00B4}' => '\'',
            '\u{2010}' | '\u{2011}' => '-',
            c if c.is_alphanumeric() || c.is_whitespace() => c,
            '\'' | '-' | ',' => c,
            _ => ' ',
        })
        .collect();

    let text = mapped.split_whitespace().collect::<Vec<_>>().join(" ");
    NormalizedTranscript { text }
}

impl NormalizedTranscript {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when nothing but whitespace or punctuation was spoken.
    pub fn is_empty(&self) -> bool {
        !self.text.chars().any(char::is_alphanumeric)
    }

    /// Words in utterance order, each flagged when a comma follows it.
    fn tokens(&self) -> Vec<(&str, bool)> {
        let mut tokens: Vec<(&str, bool)> = Vec::new();
        for chunk in self.text.split(' ') {
            for (i, part) in chunk.split(',').enumerate() {
                if i > 0 {
                    // A comma preceded this part; flag the previous word,
                    // even across a space as in "alden , what".
                    if let Some(last) = tokens.last_mut() {
                        last.1 = true;
                    }
                }
                let word = part.trim_matches(|c| c == '\'' || c == '-');
                if !word.is_empty() {
                    tokens.push((word, false));
                }
            }
        }
        tokens
    }

    /// Words spoken as a wake word, in utterance order without repeats.
    ///
    /// A candidate is the word after any `hey`, or any word immediately
    /// followed by a comma.
    pub fn wake_candidates(&self) -> Vec<String> {
        let tokens = self.tokens();
        let mut candidates: Vec<String> = Vec::new();
        let mut push = |word: &str| {
            if word != "hey" && !candidates.iter().any(|c| c == word) {
                candidates.push(word.to_string());
            }
        };

        for (i, (word, followed_by_comma)) in tokens.iter().enumerate() {
            if *word == "hey" {
                if let Some((next, _)) = tokens.get(i + 1) {
                    push(*next);
                }
            }
            if *followed_by_comma {
                push(*word);
            }
        }
        candidates
    }

    /// Returns the universal command mentioned in the transcript, if any.
    pub fn universal_command(&self) -> Option<&'static str> {
        static PATTERNS: OnceLock<Vec<KeywordPattern>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            UNIVERSAL_COMMANDS
                .iter()
                .filter_map(|cmd| KeywordPattern::new(cmd).ok())
                .collect()
        });
        let keyword = first_match(patterns, &self.text)?;
        UNIVERSAL_COMMANDS.iter().copied().find(|c| *c == keyword)
    }
}

impl fmt::Display for NormalizedTranscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
