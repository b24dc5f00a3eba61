//! Natural-language summaries of search results.

use std::sync::Arc;
use std::time::Duration;

use ruedas_core::model::{Language, Query, VehicleRecord};

use crate::cache::{ResponseKey, SearchCaches};
use crate::error::{SearchError, SearchResult};
use crate::llm::{complete_within, ChatRequest, LanguageModel};

const MAX_TOKENS: u32 = 150;

fn system_prompt(language: Language) -> String {
    format!(
        "You are a friendly vehicle dealership assistant. Write a short answer \
         (at most three sentences) in {} telling the customer how many vehicles \
         matched their search and mentioning one or two notable attributes of the \
         sample vehicles. Do not invent vehicles, prices or features that are not \
         listed. Do not use Markdown.",
        language.name()
    )
}

fn user_message(query: &Query, total: usize, samples: &[VehicleRecord]) -> String {
    let mut message = format!("Customer query: {}\nMatching vehicles: {total}\n", query.raw_text);
    if !samples.is_empty() {
        message.push_str("Sample vehicles:\n");
        for vehicle in samples {
            message.push_str("- ");
            message.push_str(&vehicle.summary());
            message.push('\n');
        }
    }
    message
}

/// The deterministic sentence used when the model cannot answer.
pub fn template_response(language: Language, total: usize, query: &str) -> String {
    match (language, total) {
        (Language::En, 0) => format!(
            "I couldn't find any vehicles matching \"{query}\". \
             Here are some ideas to broaden your search."
        ),
        (Language::Es, 0) => format!(
            "No encontré vehículos que coincidan con \"{query}\". \
             Aquí tienes algunas ideas para ampliar tu búsqueda."
        ),
        (Language::En, 1) => "I found 1 vehicle matching your search.".to_string(),
        (Language::Es, 1) => "Encontré 1 vehículo que coincide con tu búsqueda.".to_string(),
        (Language::En, n) => format!("I found {n} vehicles matching your search."),
        (Language::Es, n) => format!("Encontré {n} vehículos que coinciden con tu búsqueda."),
    }
}

#[derive(Debug, Clone)]
pub struct ResponseSynthesizer {
    model: Arc<dyn LanguageModel>,
    caches: Arc<SearchCaches>,
    timeout: Duration,
    sample_size: usize,
}

impl ResponseSynthesizer {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        caches: Arc<SearchCaches>,
        timeout: Duration,
        sample_size: usize,
    ) -> Self {
        Self {
            model,
            caches,
            timeout,
            sample_size,
        }
    }

    /// Summarize `vehicles` for `query` in the query's language.
    ///
    /// Model answers are cached per (language, result count, query); the
    /// templated fallback is not.
    pub async fn synthesize(&self, query: &Query, vehicles: &[VehicleRecord]) -> String {
        let key = ResponseKey {
            language: query.language,
            result_count: vehicles.len(),
            normalized_query: query.normalized_text.clone(),
        };
        let samples = &vehicles[..vehicles.len().min(self.sample_size)];

        match self
            .caches
            .responses
            .get_or_try_compute(key, || self.ask_model(query, vehicles.len(), samples))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                log::warn!("{e}; using templated response");
                template_response(query.language, vehicles.len(), &query.raw_text)
            }
        }
    }

    async fn ask_model(
        &self,
        query: &Query,
        total: usize,
        samples: &[VehicleRecord],
    ) -> SearchResult<String> {
        let request = ChatRequest::new(
            system_prompt(query.language),
            user_message(query, total, samples),
        )
        .temperature(0.7)
        .max_tokens(MAX_TOKENS);

        let text = complete_within(self.model.as_ref(), &request, self.timeout)
            .await
            .map_err(|e| SearchError::ResponseSynthesisError(e.to_string()))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SearchError::ResponseSynthesisError(
                "model returned an empty answer".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}
