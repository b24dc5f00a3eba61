use serde::{Deserialize, Serialize};
use std::fmt;

/// The three filter tiers, from most precise to most permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchTier {
    /// One predicate per extracted field.
    Optimized,
    /// Brand and model (or query tokens) only.
    Simplified,
    /// Any brand, model or token, loosely matched.
    Keyword,
}

impl SearchTier {
    /// All tiers in execution order.
    pub const ALL: [Self; 3] = [Self::Optimized, Self::Simplified, Self::Keyword];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Optimized => "OPTIMIZED",
            Self::Simplified => "SIMPLIFIED",
            Self::Keyword => "KEYWORD",
        }
    }
}

impl fmt::Display for SearchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
