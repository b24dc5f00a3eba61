//! Vehicle-domain intent classification.
//!
//! Stage one is a whole-word keyword test against the bilingual vehicle
//! vocabulary and needs no external call. Only queries that match nothing
//! are sent to the language model for a yes/no answer.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use ruedas_core::model::word_haystack;
use ruedas_core::vocab::{
    find_canonical, has_any, has_phrase, AUTOMOTIVE_KEYWORDS, BRANDS, FUEL_TYPES, MODELS,
    TECHNICAL_KEYWORDS, TRANSMISSIONS, VEHICLE_TYPES,
};

use crate::error::{SearchError, SearchResult};
use crate::llm::{complete_within, ChatRequest, LanguageModel};

const CLASSIFY_PROMPT: &str = "You decide whether a search query is about buying, \
finding or comparing motor vehicles (cars, trucks, SUVs, vans, motorcycles) or their \
specifications. Queries may be in English or Spanish. Answer with exactly one word: \
yes or no.\n\nExamples:\n\
\"something reliable for my family of five\" -> yes\n\
\"algo económico para ir al trabajo\" -> yes\n\
\"4x4 with third row\" -> yes\n\
\"weather in san juan tomorrow\" -> no\n\
\"receta de arroz con gandules\" -> no\n\
\"who won the game last night\" -> no";

/// How the intent decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    /// Matched the vehicle vocabulary.
    Keyword,
    /// The language model answered.
    Model,
    /// No keyword matched and the model could not answer.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntentDecision {
    pub is_vehicle: bool,
    pub source: IntentSource,
}

/// True when the text names any vehicle term, brand or model.
pub fn matches_vehicle_vocabulary(text: &str) -> bool {
    let haystack = word_haystack(text);
    has_any(&haystack, AUTOMOTIVE_KEYWORDS)
        || has_any(&haystack, TECHNICAL_KEYWORDS)
        || find_canonical(BRANDS, &haystack).is_some()
        || MODELS.iter().any(|(model, _)| has_phrase(&haystack, model))
        || find_canonical(VEHICLE_TYPES, &haystack).is_some()
        || find_canonical(FUEL_TYPES, &haystack).is_some()
        || find_canonical(TRANSMISSIONS, &haystack).is_some()
}

/// Parse the model's one-word answer.
fn parse_answer(text: &str) -> Option<bool> {
    let word = text
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    match word.as_str() {
        "yes" | "si" | "sí" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct IntentClassifier {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl IntentClassifier {
    pub fn new(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Decide whether a normalized query belongs to the vehicle domain.
    pub async fn classify(&self, normalized: &str) -> IntentDecision {
        if matches_vehicle_vocabulary(normalized) {
            return IntentDecision {
                is_vehicle: true,
                source: IntentSource::Keyword,
            };
        }

        match self.ask_model(normalized).await {
            Ok(is_vehicle) => IntentDecision {
                is_vehicle,
                source: IntentSource::Model,
            },
            Err(e) => {
                log::warn!("{e}; treating query as not vehicle-related");
                IntentDecision {
                    is_vehicle: false,
                    source: IntentSource::Fallback,
                }
            }
        }
    }

    async fn ask_model(&self, normalized: &str) -> SearchResult<bool> {
        let request = ChatRequest::new(CLASSIFY_PROMPT, normalized).max_tokens(3);
        let answer = complete_within(self.model.as_ref(), &request, self.timeout)
            .await
            .map_err(|e| SearchError::ClassificationError(e.to_string()))?;
        parse_answer(&answer).ok_or_else(|| {
            SearchError::ClassificationError(format!("unexpected answer {answer:?}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::DisabledModel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Answering {
        answer: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for Answering {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.to_string())
        }
    }

    fn answering(answer: &'static str) -> Arc<Answering> {
        Arc::new(Answering {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_vocabulary_matches() {
        assert!(matches_vehicle_vocabulary("red car"));
        assert!(matches_vehicle_vocabulary("carro rojo"));
        assert!(matches_vehicle_vocabulary("bmw under $50,000"));
        assert!(matches_vehicle_vocabulary("corolla 2019"));
        assert!(matches_vehicle_vocabulary("8 cylinder"));
        assert!(matches_vehicle_vocabulary("una jeepeta"));
        assert!(!matches_vehicle_vocabulary("weather in san juan"));
        // Whole words only.
        assert!(!matches_vehicle_vocabulary("cartoon network"));
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("Yes."), Some(true));
        assert_eq!(parse_answer(" no "), Some(false));
        assert_eq!(parse_answer("Sí"), Some(true));
        assert_eq!(parse_answer("maybe"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[tokio::test]
    async fn test_keyword_fast_path_skips_model() {
        let model = answering("no");
        let classifier = IntentClassifier::new(
            Arc::clone(&model) as Arc<dyn LanguageModel>,
            Duration::from_secs(1),
        );
        let decision = classifier.classify("toyota tacoma").await;
        assert!(decision.is_vehicle);
        assert_eq!(decision.source, IntentSource::Keyword);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_decides_unmatched_queries() {
        let model = answering("yes");
        let classifier = IntentClassifier::new(
            Arc::clone(&model) as Arc<dyn LanguageModel>,
            Duration::from_secs(1),
        );
        let decision = classifier.classify("something for my family of five").await;
        assert!(decision.is_vehicle);
        assert_eq!(decision.source, IntentSource::Model);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_keyword_result() {
        let classifier = IntentClassifier::new(Arc::new(DisabledModel), Duration::from_secs(1));
        let decision = classifier.classify("weather tomorrow").await;
        assert!(!decision.is_vehicle);
        assert_eq!(decision.source, IntentSource::Fallback);
    }
}
