//! Error types for the search pipeline.
//!
//! [`SearchError`] names every stage failure the pipeline knows how to
//! recover from. None of them escape [`SearchService::search`]: each is
//! logged and replaced by the stage's deterministic fallback.
//!
//! [`SearchService::search`]: crate::service::SearchService::search

use thiserror::Error;

/// Failures of a single pipeline stage.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("parameter extraction timed out")]
    ExtractionTimeout,

    /// The model answered, but not with parameters we could accept.
    #[error("could not parse extracted parameters: {0}")]
    ExtractionParseError(String),

    #[error("intent classification failed: {0}")]
    ClassificationError(String),

    /// The inventory store rejected or failed the tier query.
    #[error("query execution failed: {0}")]
    QueryExecutionError(String),

    #[error("query timed out after {0} ms")]
    QueryTimeout(u64),

    #[error("response synthesis failed: {0}")]
    ResponseSynthesisError(String),

    #[error("suggestion generation failed: {0}")]
    SuggestionGenerationError(String),

    #[error("translation failed: {0}")]
    TranslationError(String),
}

impl SearchError {
    /// Returns `true` when the stage ran out of time rather than failing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ExtractionTimeout | Self::QueryTimeout(_))
    }
}

impl From<ruedas_core::Error> for SearchError {
    fn from(e: ruedas_core::Error) -> Self {
        Self::QueryExecutionError(e.to_string())
    }
}

/// Failures talking to the language-model service.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The service answered with a non-success status.
    #[error("HTTP error from {model}: {message}")]
    Http { model: String, message: String },

    /// The service's reply did not have the expected shape.
    #[error("parse error from {model}: {message}")]
    Parse { model: String, message: String },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model call timed out after {0} ms")]
    Timeout(u64),

    /// No model is configured.
    #[error("language model disabled")]
    Disabled,
}

impl LlmError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Request(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Convenience alias for pipeline stage results.
pub type SearchResult<T> = std::result::Result<T, SearchError>;
