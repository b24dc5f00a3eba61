//! Parameter extraction.
//!
//! Two strategies run as a [`cascade`]: the language model first, then the
//! deterministic rules, which always succeed. Whichever path produced the
//! parameters, post-processing guarantees a non-empty `location` and merges
//! in the deterministic color when the model left it out.

pub mod model;
pub mod rules;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use ruedas_core::model::{ExtractedParameters, Query, QueryType};

use crate::cascade::{cascade, Attempt, Rejected};
use crate::color::detect_color;
use crate::error::{SearchError, SearchResult};
use crate::llm::{complete_within, strip_code_fences, ChatRequest, LanguageModel};

/// Where extracted parameters came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Model,
    Rules,
}

const STRATEGIES: [ExtractionSource; 2] = [ExtractionSource::Model, ExtractionSource::Rules];

/// Extracted parameters plus how they were obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    pub params: ExtractedParameters,
    pub query_type: QueryType,
    pub is_technical_search: bool,
    pub source: ExtractionSource,
    /// Strategies that were tried first and fell through.
    pub rejected: Vec<Rejected<ExtractionSource>>,
}

#[derive(Debug, Clone)]
struct Extracted {
    params: ExtractedParameters,
    is_technical_search: bool,
}

#[derive(Debug, Clone)]
pub struct ParameterExtractor {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
    default_location: String,
}

impl ParameterExtractor {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        timeout: Duration,
        default_location: impl Into<String>,
    ) -> Self {
        Self {
            model,
            timeout,
            default_location: default_location.into(),
        }
    }

    /// Turn a query into search parameters. Never fails.
    pub async fn extract(&self, query: &Query) -> ExtractionOutcome {
        let outcome = cascade(&STRATEGIES, |source| self.attempt(source, query)).await;

        let (source, extracted) = outcome.accepted.unwrap_or_else(|| {
            let rules = rules::extract(&query.normalized_text);
            (
                ExtractionSource::Rules,
                Extracted {
                    params: rules.params,
                    is_technical_search: rules.is_technical,
                },
            )
        });

        let mut params = extracted.params;
        params.ensure_location(&self.default_location);
        if params.color.is_none() {
            params.color = detect_color(&query.normalized_text);
        }

        let is_technical_search = extracted.is_technical_search || params.has_engine_specs();
        let query_type = if is_technical_search {
            QueryType::Technical
        } else {
            QueryType::General
        };

        log::info!(
            "Extracted parameters via {:?} ({:?}): {}",
            source,
            query_type,
            serde_json::to_string(&params).unwrap_or_default()
        );

        ExtractionOutcome {
            params,
            query_type,
            is_technical_search,
            source,
            rejected: outcome.rejected,
        }
    }

    async fn attempt(&self, source: ExtractionSource, query: &Query) -> Attempt<Extracted> {
        match source {
            ExtractionSource::Model => match self.from_model(query).await {
                Ok(extracted) => Attempt::Accept(extracted),
                Err(e) => {
                    log::warn!("{e}; falling back to rule-based extraction");
                    Attempt::FallThrough(e.to_string())
                }
            },
            ExtractionSource::Rules => {
                let rules = rules::extract(&query.normalized_text);
                Attempt::Accept(Extracted {
                    params: rules.params,
                    is_technical_search: rules.is_technical,
                })
            }
        }
    }

    async fn from_model(&self, query: &Query) -> SearchResult<Extracted> {
        let request = ChatRequest::new(
            model::EXTRACTION_PROMPT,
            model::user_message(&query.raw_text, query.language),
        )
        .json()
        .max_tokens(400);

        let text = complete_within(self.model.as_ref(), &request, self.timeout)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::ExtractionTimeout
                } else {
                    SearchError::ExtractionParseError(e.to_string())
                }
            })?;

        let parsed = model::parse_response(strip_code_fences(&text))?;
        let is_technical_search = parsed.is_technical_search.unwrap_or(false)
            || parsed.query_type == Some(QueryType::Technical);
        Ok(Extracted {
            params: parsed.params,
            is_technical_search,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::DisabledModel;
    use async_trait::async_trait;
    use ruedas_core::model::{Bounds, Language};

    #[derive(Debug)]
    struct Fixed(&'static str);

    #[async_trait]
    impl LanguageModel for Fixed {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug)]
    struct Stalled;

    #[async_trait]
    impl LanguageModel for Stalled {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("{}".to_string())
        }
    }

    fn extractor(model: Arc<dyn LanguageModel>) -> ParameterExtractor {
        ParameterExtractor::new(model, Duration::from_millis(50), "Puerto Rico")
    }

    #[tokio::test]
    async fn test_model_answer_is_used() {
        let model = Arc::new(Fixed(
            "```json\n{\"brand\": \"bmw\", \"price_range\": {\"max\": 50000}}\n```",
        ));
        let query = Query::new("BMW under $50,000", Language::En);
        let outcome = extractor(model).extract(&query).await;

        assert_eq!(outcome.source, ExtractionSource::Model);
        assert_eq!(outcome.params.brand, vec!["bmw"]);
        assert_eq!(
            outcome.params.price_range,
            Some(Bounds::new(None, Some(50_000.0)))
        );
        assert_eq!(outcome.params.location, "Puerto Rico");
        assert!(outcome.rejected.is_empty());
    }

    #[tokio::test]
    async fn test_detector_color_is_merged_into_model_answer() {
        let model = Arc::new(Fixed(r#"{"vehicle_type": "suv"}"#));
        let query = Query::new("jeepeta roja", Language::Es);
        let outcome = extractor(model).extract(&query).await;
        assert_eq!(outcome.params.color.as_deref(), Some("red"));
        assert_eq!(outcome.params.vehicle_type, vec!["suv"]);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_rules() {
        let query = Query::new("8 cylinder car", Language::En);
        let outcome = extractor(Arc::new(Stalled)).extract(&query).await;

        assert_eq!(outcome.source, ExtractionSource::Rules);
        assert_eq!(outcome.rejected.len(), 1);
        assert!(outcome.rejected[0].reason.contains("timed out"));
        assert_eq!(outcome.query_type, QueryType::Technical);
        assert!(outcome.is_technical_search);
        assert_eq!(
            outcome.params.engine_specs.as_ref().and_then(|e| e.cylinders),
            Some(8)
        );
    }

    #[tokio::test]
    async fn test_invalid_json_falls_back_to_rules() {
        let query = Query::new("BMW under $50,000", Language::En);
        let outcome = extractor(Arc::new(Fixed("{\"brand\": 7}")))
            .extract(&query)
            .await;
        assert_eq!(outcome.source, ExtractionSource::Rules);
        assert_eq!(outcome.params.brand, vec!["bmw"]);
        assert_eq!(outcome.params.price_range.and_then(|r| r.max), Some(50_000.0));
        assert_eq!(outcome.params.location, "Puerto Rico");
        assert_eq!(outcome.query_type, QueryType::General);
    }

    #[tokio::test]
    async fn test_location_is_never_empty() {
        for text in ["", "red car", "carro rojo en Ponce", "8 cylinder electric car"] {
            let query = Query::new(text, Language::En);
            let outcome = extractor(Arc::new(DisabledModel)).extract(&query).await;
            assert!(!outcome.params.location.is_empty(), "{text:?}");
        }
    }

    #[tokio::test]
    async fn test_everyday_spanish_does_not_add_a_color() {
        let query = Query::new("toyota no tan cara", Language::Es);
        let outcome = extractor(Arc::new(DisabledModel)).extract(&query).await;
        assert_eq!(outcome.params.brand, vec!["toyota"]);
        assert_eq!(outcome.params.color, None);
    }

    #[tokio::test]
    async fn test_explicit_location_is_kept() {
        let query = Query::new("carro rojo en Ponce", Language::Es);
        let outcome = extractor(Arc::new(DisabledModel)).extract(&query).await;
        assert_eq!(outcome.params.location, "Ponce");
    }
}
