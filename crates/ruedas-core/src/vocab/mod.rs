//! Static bilingual vocabulary tables.
//!
//! Every table maps a canonical (English, lowercase) term to the spellings
//! users actually type in English or Spanish. Lookups are whole-word and
//! accent-insensitive: the haystack comes from
//! [`word_haystack`](crate::model::word_haystack) and each variant is run
//! through the same tokenizer before comparison, so `"f-150"` matches
//! `"F 150"` and `"eléctrico"` matches `"electrico"`.
//!
//! The tables are plain `const` data and need no synchronization.

pub mod brands;
pub mod colors;
pub mod terms;

pub use brands::{brand_for_model, BRANDS, MODELS};
pub use colors::{COLORS, COLOR_CONTEXT, COLOR_DESCRIPTORS, CONTEXT_ONLY_SPELLINGS};
pub use terms::{
    AUTOMOTIVE_KEYWORDS, CONDITIONS, ENGINE_TYPES, ENGLISH_HINTS, ENGLISH_INDICATORS,
    FUEL_TYPES, LOCATIONS, SPANISH_HINTS, SPANISH_INDICATORS, STOP_WORDS, TECHNICAL_KEYWORDS,
    TRANSMISSIONS, VEHICLE_TYPES,
};

use crate::model::tokenize;

/// A canonical term and its variant spellings.
pub type SynonymTable = [(&'static str, &'static [&'static str])];

/// Whole-word, accent-insensitive phrase test.
///
/// `haystack` must come from [`word_haystack`](crate::model::word_haystack).
#[must_use]
pub fn has_phrase(haystack: &str, phrase: &str) -> bool {
    let needle = tokenize(phrase).join(" ");
    !needle.is_empty() && haystack.contains(&format!(" {needle} "))
}

/// True when any of `words` occurs as a whole word or phrase.
#[must_use]
pub fn has_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|w| has_phrase(haystack, w))
}

/// Find the canonical term whose variant matches the haystack.
///
/// When several variants match, the longest one wins so that
/// `"pearl white"` beats `"white"`.
#[must_use]
pub fn find_canonical(table: &SynonymTable, haystack: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for &(canonical, variants) in table {
        for variant in std::iter::once(&canonical).chain(variants.iter()) {
            if has_phrase(haystack, variant) {
                let len = variant.chars().count();
                if best.is_none_or(|(_, best_len)| len > best_len) {
                    best = Some((canonical, len));
                }
            }
        }
    }
    best.map(|(canonical, _)| canonical)
}

/// Every canonical term with at least one matching variant, in table order.
#[must_use]
pub fn find_all_canonical(table: &SynonymTable, haystack: &str) -> Vec<&'static str> {
    table
        .iter()
        .filter(|(canonical, variants)| {
            has_phrase(haystack, canonical) || has_any(haystack, variants)
        })
        .map(|&(canonical, _)| canonical)
        .collect()
}

/// Map a free-form value onto its canonical term, if the table knows it.
#[must_use]
pub fn canonicalize(table: &SynonymTable, value: &str) -> Option<&'static str> {
    let wanted = tokenize(value).join(" ");
    if wanted.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|(canonical, variants)| {
            std::iter::once(canonical)
                .chain(variants.iter())
                .any(|v| tokenize(v).join(" ") == wanted)
        })
        .map(|&(canonical, _)| canonical)
}

/// The canonical term followed by all of its variants.
///
/// Unknown terms yield just themselves, so callers can always match on the
/// value they were given.
#[must_use]
pub fn spellings_of(table: &SynonymTable, term: &str) -> Vec<String> {
    let canonical = canonicalize(table, term);
    match canonical.and_then(|c| table.iter().find(|(name, _)| *name == c)) {
        Some(&(name, variants)) => std::iter::once(name)
            .chain(variants.iter().copied())
            .map(str::to_string)
            .collect(),
        None => vec![term.to_string()],
    }
}
