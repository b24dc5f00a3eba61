//! Suggestions for searches that found nothing.
//!
//! The model is asked why the search failed and for three more permissive
//! alternatives. Spanish queries get every translatable string of the
//! answer translated in one batched call. Any failure, at either step,
//! yields the canned set built from the extracted parameters instead.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ruedas_core::model::{
    format_price, AlternativeSearch, Bounds, ExtractedParameters, Language, Query, SuggestionSet,
};

use crate::error::{SearchError, SearchResult};
use crate::extract::model::parameters_from_value;
use crate::llm::{complete_within, strip_code_fences, ChatRequest, LanguageModel};

const ALTERNATIVES: usize = 3;
const FOLLOW_UPS: usize = 2;

const SUGGEST_PROMPT: &str = r#"A shopper's vehicle search returned no results. You receive their query and the filters that were applied, as JSON.
Return ONLY a JSON object:
{
  "analysis": short explanation of why nothing matched; point out filters that contradict each other or are too narrow,
  "alternative_searches": exactly 3 objects {"description": string, "modified_parameters": object with the same keys as the filters}, each less restrictive than the original search,
  "follow_up_questions": exactly 2 short questions that would help narrow down what the shopper wants
}
Keep the original location in every alternative. Write in English."#;

const TRANSLATE_PROMPT: &str = r#"Translate every string in the "texts" array from English to Puerto Rican Spanish. Keep numbers, prices, brand names and model names unchanged.
Return ONLY a JSON object {"translations": [...]} with the same number of strings, in the same order."#;

#[derive(Debug, Deserialize)]
struct RawSuggestions {
    analysis: String,
    #[serde(default)]
    alternative_searches: Vec<RawAlternative>,
    #[serde(default)]
    follow_up_questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawAlternative {
    description: String,
    #[serde(default)]
    modified_parameters: Value,
}

#[derive(Debug, Serialize)]
struct TranslationRequest<'a> {
    texts: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    translations: Vec<String>,
}

/// Parse and validate a suggestion answer. Alternatives inherit the
/// original location when they leave it out.
pub fn parse_suggestions(
    text: &str,
    original: &ExtractedParameters,
) -> SearchResult<SuggestionSet> {
    let invalid = SearchError::SuggestionGenerationError;

    let raw: RawSuggestions = serde_json::from_str(strip_code_fences(text))
        .map_err(|e| invalid(format!("invalid JSON: {e}")))?;

    let analysis = raw.analysis.trim().to_string();
    if analysis.is_empty() {
        return Err(invalid("empty analysis".to_string()));
    }

    let mut alternative_searches = Vec::with_capacity(ALTERNATIVES);
    for alternative in raw.alternative_searches.into_iter().take(ALTERNATIVES) {
        let description = alternative.description.trim().to_string();
        if description.is_empty() {
            return Err(invalid("alternative without a description".to_string()));
        }
        let mut modified_parameters =
            parameters_from_value(&alternative.modified_parameters).map_err(invalid)?;
        modified_parameters.ensure_location(&original.location);
        alternative_searches.push(AlternativeSearch {
            description,
            modified_parameters,
        });
    }
    if alternative_searches.is_empty() {
        return Err(invalid("no alternative searches".to_string()));
    }

    let follow_up_questions: Vec<String> = raw
        .follow_up_questions
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .take(FOLLOW_UPS)
        .map(str::to_string)
        .collect();
    if follow_up_questions.is_empty() {
        return Err(invalid("no follow-up questions".to_string()));
    }

    Ok(SuggestionSet {
        analysis,
        alternative_searches,
        follow_up_questions,
    })
}

/// Every translatable string of `set`, in a fixed order.
fn translatable(set: &SuggestionSet) -> Vec<&str> {
    std::iter::once(set.analysis.as_str())
        .chain(set.alternative_searches.iter().map(|a| a.description.as_str()))
        .chain(set.follow_up_questions.iter().map(String::as_str))
        .collect()
}

/// Write `translations` back into `set` in the order of [`translatable`].
fn apply_translations(set: &mut SuggestionSet, translations: Vec<String>) -> SearchResult<()> {
    let expected = 1 + set.alternative_searches.len() + set.follow_up_questions.len();
    if translations.len() != expected {
        return Err(SearchError::TranslationError(format!(
            "expected {expected} translations, got {}",
            translations.len()
        )));
    }
    if translations.iter().any(|t| t.trim().is_empty()) {
        return Err(SearchError::TranslationError("empty translation".to_string()));
    }

    let translations = translations.into_iter().map(|t| t.trim().to_string());
    let targets = std::iter::once(&mut set.analysis)
        .chain(set.alternative_searches.iter_mut().map(|a| &mut a.description))
        .chain(set.follow_up_questions.iter_mut());
    for (target, text) in targets.zip(translations) {
        *target = text;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SuggestionGenerator {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl SuggestionGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Build suggestions for a zero-result search. Never fails.
    pub async fn suggest(&self, query: &Query, params: &ExtractedParameters) -> SuggestionSet {
        let mut set = match self.ask_model(query, params).await {
            Ok(set) => set,
            Err(e) => {
                log::warn!("{e}; using canned suggestions");
                return canned_suggestions(params, query.language);
            }
        };

        if query.language == Language::Es {
            if let Err(e) = self.translate(&mut set).await {
                log::warn!("{e}; using canned Spanish suggestions");
                return canned_suggestions(params, Language::Es);
            }
        }
        set
    }

    async fn ask_model(
        &self,
        query: &Query,
        params: &ExtractedParameters,
    ) -> SearchResult<SuggestionSet> {
        let filters = serde_json::to_string(params)
            .map_err(|e| SearchError::SuggestionGenerationError(e.to_string()))?;
        let request = ChatRequest::new(
            SUGGEST_PROMPT,
            format!("Query: {}\nFilters: {filters}", query.raw_text),
        )
        .json()
        .temperature(0.7)
        .max_tokens(800);

        let text = complete_within(self.model.as_ref(), &request, self.timeout)
            .await
            .map_err(|e| SearchError::SuggestionGenerationError(e.to_string()))?;
        parse_suggestions(&text, params)
    }

    /// Translate the whole set with a single model call.
    async fn translate(&self, set: &mut SuggestionSet) -> SearchResult<()> {
        let payload = serde_json::to_string(&TranslationRequest {
            texts: translatable(set),
        })
        .map_err(|e| SearchError::TranslationError(e.to_string()))?;
        let request = ChatRequest::new(TRANSLATE_PROMPT, payload)
            .json()
            .max_tokens(800);

        let text = complete_within(self.model.as_ref(), &request, self.timeout)
            .await
            .map_err(|e| SearchError::TranslationError(e.to_string()))?;
        let response: TranslationResponse = serde_json::from_str(strip_code_fences(&text))
            .map_err(|e| SearchError::TranslationError(format!("invalid JSON: {e}")))?;
        apply_translations(set, response.translations)
    }
}

// ---------------------------------------------------------------------------
// Canned suggestions
// ---------------------------------------------------------------------------

/// True when the parameters ask for an electric vehicle with combustion
/// engine characteristics.
pub fn has_fuel_contradiction(params: &ExtractedParameters) -> bool {
    params.fuel_type.as_deref() == Some("electric") && params.has_engine_specs()
}

/// A short human-readable list of the active filters.
fn describe_filters(params: &ExtractedParameters, language: Language) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.extend(params.brand.iter().cloned());
    parts.extend(params.model.iter().cloned());
    parts.extend(params.vehicle_type.iter().cloned());
    if let Some(specs) = &params.engine_specs {
        if let Some(cylinders) = specs.cylinders {
            parts.push(format!("{cylinders} {}", language.pick("cylinders", "cilindros")));
        }
        parts.extend(specs.displacement.iter().cloned());
        parts.extend(specs.engine_type.iter().cloned());
    }
    for value in [
        &params.fuel_type,
        &params.transmission,
        &params.color,
        &params.condition,
    ] {
        parts.extend(value.iter().cloned());
    }
    if let Some(max) = params.price_range.and_then(|r| r.max) {
        parts.push(format!("{} {}", language.pick("under", "menos de"), format_price(max)));
    }
    if let Some(min) = params.year_range.and_then(|r| r.min) {
        parts.push(format!("{}{min}", language.pick("from ", "desde ")));
    }
    parts.join(", ")
}

fn relaxations(params: &ExtractedParameters, language: Language) -> Vec<AlternativeSearch> {
    let mut out: Vec<AlternativeSearch> = Vec::new();
    let mut push = |description: String, modified_parameters: ExtractedParameters| {
        if modified_parameters != *params
            && !out
                .iter()
                .any(|a| a.modified_parameters == modified_parameters)
        {
            out.push(AlternativeSearch {
                description,
                modified_parameters,
            });
        }
    };

    if has_fuel_contradiction(params) {
        let mut electric = params.clone();
        electric.engine_specs = None;
        push(
            language
                .pick(
                    "Electric vehicles without engine requirements",
                    "Vehículos eléctricos sin requisitos de motor",
                )
                .to_string(),
            electric,
        );

        let mut combustion = params.clone();
        combustion.fuel_type = None;
        push(
            language
                .pick(
                    "Same engine specifications with any fuel type",
                    "Las mismas especificaciones de motor con cualquier combustible",
                )
                .to_string(),
            combustion,
        );
    }

    if let Some(max) = params.price_range.and_then(|r| r.max) {
        let raised = (max * 1.2 / 1_000.0).round() * 1_000.0;
        let mut wider = params.clone();
        wider.price_range = Some(Bounds::new(params.price_range.and_then(|r| r.min), Some(raised)));
        push(
            format!(
                "{} {}",
                language.pick("Raise the budget to", "Aumentar el presupuesto a"),
                format_price(raised)
            ),
            wider,
        );
    }

    if let Some(min) = params.year_range.and_then(|r| r.min) {
        let mut older = params.clone();
        older.year_range = Some(Bounds::new(
            Some(min - 3),
            params.year_range.and_then(|r| r.max),
        ));
        push(
            format!(
                "{} {}",
                language.pick("Include models from", "Incluir modelos desde"),
                min - 3
            ),
            older,
        );
    }

    if params.color.is_some() {
        let mut any_color = params.clone();
        any_color.color = None;
        push(
            language.pick("Any color", "Cualquier color").to_string(),
            any_color,
        );
    }

    if params.has_engine_specs() && !has_fuel_contradiction(params) {
        let mut any_engine = params.clone();
        any_engine.engine_specs = None;
        push(
            language
                .pick("Any engine configuration", "Cualquier configuración de motor")
                .to_string(),
            any_engine,
        );
    }

    if !params.brand.is_empty() && !params.model.is_empty() {
        let mut whole_brand = params.clone();
        whole_brand.model.clear();
        push(
            format!(
                "{} {}",
                language.pick("All models from", "Todos los modelos de"),
                params.brand.join(", ")
            ),
            whole_brand,
        );
    }

    if params.transmission.is_some() || params.condition.is_some() || !params.vehicle_type.is_empty()
    {
        let mut looser = params.clone();
        looser.transmission = None;
        looser.condition = None;
        looser.vehicle_type.clear();
        push(
            language
                .pick(
                    "Any body style, transmission and condition",
                    "Cualquier carrocería, transmisión y condición",
                )
                .to_string(),
            looser,
        );
    }

    if !params.brand.is_empty() && !params.has_no_filters() {
        let mut any_brand = params.clone();
        any_brand.brand.clear();
        any_brand.model.clear();
        push(
            language
                .pick("Same search with any brand", "La misma búsqueda con cualquier marca")
                .to_string(),
            any_brand,
        );
    }

    let everything = ExtractedParameters {
        location: params.location.clone(),
        ..ExtractedParameters::default()
    };
    push(
        format!(
            "{} {}",
            language.pick("Browse all vehicles in", "Ver todos los vehículos en"),
            params.location
        ),
        everything,
    );

    out.truncate(ALTERNATIVES);
    out
}

/// The deterministic suggestion set used when the model is unavailable.
pub fn canned_suggestions(params: &ExtractedParameters, language: Language) -> SuggestionSet {
    let filters = describe_filters(params, language);

    let analysis = if has_fuel_contradiction(params) {
        language
            .pick(
                "Your search combines an electric vehicle with combustion engine \
                 specifications such as cylinders or displacement. Electric vehicles \
                 don't have cylinders, so no vehicle can match both.",
                "Tu búsqueda combina un vehículo eléctrico con especificaciones de motor \
                 de combustión como cilindros o cilindrada. Los vehículos eléctricos no \
                 tienen cilindros, así que ningún vehículo puede cumplir ambas.",
            )
            .to_string()
    } else if filters.is_empty() {
        format!(
            "{} {}.",
            language.pick(
                "There are currently no vehicles listed in",
                "No hay vehículos disponibles en este momento en"
            ),
            params.location
        )
    } else {
        format!(
            "{} ({filters}) {}",
            language.pick(
                "No vehicles matched all of your filters",
                "Ningún vehículo cumplió con todos tus filtros"
            ),
            language.pick(
                "in our current inventory. Relaxing one of them usually helps.",
                "en nuestro inventario actual. Flexibilizar alguno de ellos suele ayudar."
            )
        )
    };

    let follow_up_questions = if has_fuel_contradiction(params) {
        vec![
            language
                .pick(
                    "Are you looking for an electric vehicle or one with a gasoline engine?",
                    "¿Buscas un vehículo eléctrico o uno con motor de gasolina?",
                )
                .to_string(),
            language
                .pick(
                    "What is your maximum budget?",
                    "¿Cuál es tu presupuesto máximo?",
                )
                .to_string(),
        ]
    } else {
        vec![
            language
                .pick(
                    "What is your maximum budget?",
                    "¿Cuál es tu presupuesto máximo?",
                )
                .to_string(),
            language
                .pick(
                    "Is there a brand or body style you prefer?",
                    "¿Prefieres alguna marca o tipo de carrocería?",
                )
                .to_string(),
        ]
    };

    SuggestionSet {
        analysis,
        alternative_searches: relaxations(params, language),
        follow_up_questions,
    }
}
