//! Query state: the user's search text, filters and matching mode.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::CategoryLabels;
use crate::matcher::MatchMode;
use crate::normalize::fold_str;

/// Selected standard-category filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    /// No category filtering.
    #[default]
    All,

    /// Records following the old standard.
    Old,

    /// Records following the new standard.
    New,

    /// Records whose category equals this label verbatim.
    Label(String),
}

impl CategoryFilter {
    /// Resolves the filter to the concrete label records must carry.
    ///
    /// Returns `None` for [`CategoryFilter::All`].
    pub fn resolve<'a>(&'a self, labels: &'a CategoryLabels) -> Option<&'a str> {
        match self {
            Self::All => None,
            Self::Old => Some(&labels.old),
            Self::New => Some(&labels.new),
            Self::Label(label) => Some(label),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Old => "old",
            Self::New => "new",
            Self::Label(label) => label,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    /// Accepts `all`, `old`, `new` and their Vietnamese UI names
    /// (`Tất cả`, `Chuẩn cũ`, `Chuẩn mới`), case-insensitively. Any other
    /// value is taken as a literal label; a blank value means `All`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let filter = match fold_str(trimmed).as_str() {
            "" | "all" | "tất cả" => Self::All,
            "old" | "chuẩn cũ" => Self::Old,
            "new" | "chuẩn mới" => Self::New,
            _ => Self::Label(trimmed.to_string()),
        };
        Ok(filter)
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(filter) => filter,
            Err(never) => match never {},
        }
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        filter.as_str().to_string()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the filter pipeline needs to select records.
///
/// `match_mode` applies to both the name and the specialty comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryState {
    /// Query against the procedure name.
    pub search_text: String,

    /// Standard-category filter.
    pub category_filter: CategoryFilter,

    /// Query against the specialty.
    pub specialty_filter: String,

    /// Matching semantics for both text queries.
    pub match_mode: MatchMode,

    /// Whether search text edits apply on every keystroke.
    pub instant_search: bool,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            category_filter: CategoryFilter::All,
            specialty_filter: String::new(),
            match_mode: MatchMode::Flexible,
            instant_search: true,
        }
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_category(mut self, filter: CategoryFilter) -> Self {
        self.category_filter = filter;
        self
    }

    pub fn with_specialty(mut self, text: impl Into<String>) -> Self {
        self.specialty_filter = text.into();
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_instant_search(mut self, instant: bool) -> Self {
        self.instant_search = instant;
        self
    }

    /// Returns true when no stage of the pipeline is active.
    pub fn is_unfiltered(&self) -> bool {
        self.category_filter.is_all()
            && self.search_text.trim().is_empty()
            && self.specialty_filter.trim().is_empty()
    }
}
