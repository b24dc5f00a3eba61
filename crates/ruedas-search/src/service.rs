//! The search pipeline facade.
//!
//! `search` runs language detection, intent classification, parameter
//! extraction, tiered search, response synthesis and, for empty results,
//! suggestion generation. Every stage degrades to a deterministic fallback,
//! so `search` always returns a [`SearchResponse`].

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ruedas_core::model::{Language, Query, SearchTier, SuggestionSet, VehicleRecord};

use crate::builder::QueryBuilder;
use crate::cache::SearchCaches;
use crate::config::Config;
use crate::error::LlmError;
use crate::executor::{InventoryStore, SearchExecutor, SqliteInventory};
use crate::extract::{ExtractionOutcome, ParameterExtractor};
use crate::intent::{IntentClassifier, IntentDecision, IntentSource};
use crate::language::{self, LanguageScores};
use crate::llm::{self, LanguageModel};
use crate::suggest::SuggestionGenerator;
use crate::synthesis::ResponseSynthesizer;

/// What a search returns to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query as received.
    pub query: String,
    pub language: Language,
    pub response: String,
    pub vehicles: Vec<VehicleRecord>,
    pub total_results: usize,
    pub processing_time_ms: u64,
    /// The tier that produced `vehicles`, `OPTIMIZED` when none did.
    pub tier: SearchTier,
    /// Present if and only if every tier came back empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<SuggestionSet>,
}

const EMPTY_QUERY: &str = "Please describe the vehicle you're looking for. \
                           / Por favor, describe el vehículo que buscas.";

fn not_a_vehicle_search(language: Language) -> &'static str {
    language.pick(
        "I can only help with vehicle searches. Try something like \"red Toyota under $20,000\".",
        "Solo puedo ayudarte a buscar vehículos. Prueba algo como \"Toyota rojo por menos de $20,000\".",
    )
}

fn search_unavailable(language: Language) -> &'static str {
    language.pick(
        "Vehicle search is temporarily unavailable. Please try again in a few minutes.",
        "La búsqueda de vehículos no está disponible en este momento. Inténtalo de nuevo en unos minutos.",
    )
}

/// One tier's rendered SQL, for `explain`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSql {
    pub tier: SearchTier,
    pub sql: String,
    pub params: Vec<String>,
}

/// Everything the pipeline would decide for a query, short of running it.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub query: Query,
    pub scores: LanguageScores,
    pub intent: IntentDecision,
    /// Absent when the query is not a vehicle search.
    pub extraction: Option<ExtractionOutcome>,
    pub plans: Vec<PlanSql>,
}

#[derive(Debug)]
pub struct SearchService {
    classifier: IntentClassifier,
    extractor: ParameterExtractor,
    builder: QueryBuilder,
    executor: SearchExecutor,
    synthesizer: ResponseSynthesizer,
    suggester: SuggestionGenerator,
    caches: Arc<SearchCaches>,
}

impl SearchService {
    pub fn new(
        config: &Config,
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn InventoryStore>,
    ) -> Self {
        let caches = Arc::new(SearchCaches::new(
            config.cache.pipeline_ttl(),
            config.cache.response_ttl(),
        ));
        Self {
            classifier: IntentClassifier::new(
                Arc::clone(&model),
                config.llm.classification_timeout(),
            ),
            extractor: ParameterExtractor::new(
                Arc::clone(&model),
                config.llm.extraction_timeout(),
                &config.default_location,
            ),
            builder: QueryBuilder::new(config.search.row_limit),
            executor: SearchExecutor::new(store, config.search.tier_timeout()),
            synthesizer: ResponseSynthesizer::new(
                Arc::clone(&model),
                Arc::clone(&caches),
                config.llm.synthesis_timeout(),
                config.search.sample_size,
            ),
            suggester: SuggestionGenerator::new(model, config.llm.suggestion_timeout()),
            caches,
        }
    }

    /// Build the service against the configured model and SQLite inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let model = llm::from_config(&config.llm)?;
        let store = Arc::new(SqliteInventory::new(&config.database_path));
        Ok(Self::new(config, model, store))
    }

    /// Drop all cached pipeline results and synthesized responses.
    pub fn clear_caches(&self) {
        self.caches.clear();
    }

    /// Answer a free-text vehicle query.
    pub async fn search(&self, text: &str) -> SearchResponse {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let query = Query::new(text, language::detect(text));
        log::info!(
            "[{request_id}] Query {:?} (language: {})",
            query.normalized_text,
            query.language
        );

        if query.is_empty() {
            return reply(&query, EMPTY_QUERY.to_string(), Vec::new(), None, started);
        }

        if let Some(cached) = self.caches.pipeline.get(&query.normalized_text) {
            log::info!("[{request_id}] Pipeline cache hit");
            return cached;
        }
        log::debug!("[{request_id}] Pipeline cache miss");

        let intent = self.classifier.classify(&query.normalized_text).await;
        log::info!(
            "[{request_id}] Intent: vehicle={} via {:?}",
            intent.is_vehicle,
            intent.source
        );
        if !intent.is_vehicle {
            let text = not_a_vehicle_search(query.language).to_string();
            let response = reply(&query, text, Vec::new(), None, started);
            // A fallback "no" is retried next time; a model "no" is an answer.
            if intent.source == IntentSource::Model {
                self.caches
                    .pipeline
                    .insert(query.normalized_text.clone(), response.clone());
            }
            return response;
        }

        let extraction = self.extractor.extract(&query).await;
        let plans = self.builder.build(&extraction.params, &query);
        let outcome = self.executor.execute(&plans).await;
        for attempt in &outcome.attempts {
            log::info!("[{request_id}] {} tier: {}", attempt.tier, attempt.status);
        }

        if outcome.store_unreachable() {
            log::warn!("[{request_id}] Inventory unreachable on every tier");
            let text = search_unavailable(query.language).to_string();
            return reply(&query, text, Vec::new(), None, started);
        }

        let text = self.synthesizer.synthesize(&query, &outcome.vehicles).await;
        let suggestions = if outcome.is_empty() {
            Some(self.suggester.suggest(&query, &extraction.params).await)
        } else {
            None
        };

        let mut response = reply(&query, text, outcome.vehicles, suggestions, started);
        response.tier = outcome.tier;
        if !response.vehicles.is_empty() {
            self.caches
                .pipeline
                .insert(query.normalized_text.clone(), response.clone());
        }

        log::info!(
            "[{request_id}] {} results from {} tier in {}ms",
            response.total_results,
            response.tier,
            response.processing_time_ms
        );
        response
    }

    /// Show the pipeline's decisions for `text` without querying the store.
    pub async fn explain(&self, text: &str) -> Explanation {
        let scores = language::score(text);
        let query = Query::new(text, scores.language());
        let intent = self.classifier.classify(&query.normalized_text).await;

        let (extraction, plans) = if intent.is_vehicle && !query.is_empty() {
            let extraction = self.extractor.extract(&query).await;
            let plans = self
                .builder
                .build(&extraction.params, &query)
                .into_iter()
                .map(|plan| {
                    let (sql, params) = plan.to_sql();
                    PlanSql {
                        tier: plan.tier,
                        sql,
                        params: params.iter().map(|v| format!("{v:?}")).collect(),
                    }
                })
                .collect();
            (Some(extraction), plans)
        } else {
            (None, Vec::new())
        };

        Explanation {
            query,
            scores,
            intent,
            extraction,
            plans,
        }
    }
}

fn reply(
    query: &Query,
    response: String,
    vehicles: Vec<VehicleRecord>,
    suggestions: Option<SuggestionSet>,
    started: Instant,
) -> SearchResponse {
    SearchResponse {
        query: query.raw_text.clone(),
        language: query.language,
        response,
        total_results: vehicles.len(),
        vehicles,
        processing_time_ms: started.elapsed().as_millis() as u64,
        tier: SearchTier::Optimized,
        suggestions,
    }
}
