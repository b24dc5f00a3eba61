pub mod params;
pub mod query;
pub mod suggestion;
pub mod tier;
pub mod vehicle;

pub use params::{Bounds, EngineSpecs, ExtractedParameters, PriceRange, QueryType, YearRange};
pub use query::{fold_accents, normalize, tokenize, word_haystack, Language, Query};
pub use suggestion::{AlternativeSearch, SuggestionSet};
pub use tier::SearchTier;
pub use vehicle::{format_price, VehicleRecord};
