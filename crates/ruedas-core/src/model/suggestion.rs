use serde::{Deserialize, Serialize};

use crate::model::params::ExtractedParameters;

/// A relaxed variant of a failed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeSearch {
    pub description: String,
    pub modified_parameters: ExtractedParameters,
}

/// Diagnosis and follow-ups produced when every search tier came back empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    /// Why the search probably failed.
    pub analysis: String,
    pub alternative_searches: Vec<AlternativeSearch>,
    pub follow_up_questions: Vec<String>,
}
