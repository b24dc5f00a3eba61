//! Natural-language vehicle search for ruedas.
//!
//! Turns an English or Spanish free-text query into a ranked list of
//! inventory records plus a conversational response. Model-backed stages
//! (intent, extraction, synthesis, suggestions) each have a deterministic
//! fallback, and the inventory is searched in three progressively looser
//! tiers.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod builder;
pub mod cache;
pub mod cascade;
pub mod color;
pub mod config;
pub mod error;
pub mod executor;
pub mod extract;
pub mod intent;
pub mod language;
pub mod llm;
pub mod service;
pub mod suggest;
pub mod synthesis;

pub use builder::QueryBuilder;
pub use cache::SearchCaches;
pub use config::Config;
pub use error::{LlmError, SearchError, SearchResult};
pub use executor::{InventoryStore, SearchExecutor, SqliteInventory};
pub use extract::{ExtractionOutcome, ParameterExtractor};
pub use intent::IntentClassifier;
pub use llm::{ChatRequest, DisabledModel, LanguageModel, OpenAiClient};
pub use service::{Explanation, SearchResponse, SearchService};
pub use suggest::SuggestionGenerator;
pub use synthesis::ResponseSynthesizer;
