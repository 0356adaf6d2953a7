//! Word-presence matching of a query against a single field.
//!
//! Three predicates are supported:
//!
//! - **flexible**: every query word occurs somewhere in the text, in any order
//! - **sequential**: the query words occur in query order
//! - **exact**: the whole trimmed query occurs as one phrase
//!
//! All comparisons are case-insensitive substring checks. There is no
//! edit-distance tolerance and no scoring; a field either matches or not.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::normalize::{fold, tokenize_chars};

/// Matching semantics applied to both the name and the specialty query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum MatchMode {
    /// All words present, any order.
    #[default]
    Flexible,

    /// All words present, in query order.
    Sequential,

    /// The query as one contiguous phrase.
    Exact,
}

impl MatchMode {
    /// Returns the identifier used in configuration and session state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flexible => "flexible",
            Self::Sequential => "sequential",
            Self::Exact => "exact",
        }
    }

    /// Returns a human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Flexible => "all words, any order",
            Self::Sequential => "all words, in order",
            Self::Exact => "exact phrase",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown match mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown match mode '{0}' (expected flexible, sequential or exact)")]
pub struct ParseMatchModeError(String);

impl FromStr for MatchMode {
    type Err = ParseMatchModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flexible" => Ok(Self::Flexible),
            "sequential" => Ok(Self::Sequential),
            "exact" => Ok(Self::Exact),
            other => Err(ParseMatchModeError(other.to_string())),
        }
    }
}

/// A query compiled once and matched against many field values.
///
/// Compiling folds and tokenizes the query up front, so filtering a record
/// set only folds each field text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    mode: MatchMode,
    atoms: Vec<Vec<char>>,
}

impl Pattern {
    /// Compiles a query. Returns `None` when the trimmed query is empty,
    /// since an empty query never matches anything.
    pub fn new(query: &str, mode: MatchMode) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }

        let atoms = match mode {
            MatchMode::Exact => vec![fold(trimmed)],
            MatchMode::Flexible | MatchMode::Sequential => tokenize_chars(trimmed),
        };

        Some(Self { mode, atoms })
    }

    /// Returns the mode this pattern was compiled for.
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Checks the pattern against a field text. Empty text never matches.
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.matches_folded(&fold(text))
    }

    fn matches_folded(&self, haystack: &[char]) -> bool {
        match self.mode {
            MatchMode::Flexible | MatchMode::Exact => self
                .atoms
                .iter()
                .all(|atom| find(haystack, atom, 0).is_some()),
            MatchMode::Sequential => {
                // Greedy leftmost assignment: each word is searched from one
                // char past the previous word's start, without backtracking.
                let mut from = 0;
                for atom in &self.atoms {
                    match find(haystack, atom, from) {
                        Some(pos) => from = pos + 1,
                        None => return false,
                    }
                }
                true
            }
        }
    }
}

/// Checks whether `text` matches `query` under `mode`.
///
/// An empty (or blank) query and an empty text never match; callers skip the
/// filter entirely when the query is empty.
pub fn matches(text: &str, query: &str, mode: MatchMode) -> bool {
    Pattern::new(query, mode).is_some_and(|pattern| pattern.matches(text))
}

/// Finds the first occurrence of `needle` in `haystack` starting at `from`.
pub(crate) fn find(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
