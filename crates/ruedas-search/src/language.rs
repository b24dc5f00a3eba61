//! Lexical English/Spanish detection.
//!
//! Each language scores one point per indicator word present (articles,
//! prepositions, question words) and per domain hint word. Spanish also
//! scores for accented vowels and `ñ`, and strongly for inverted `¿`/`¡`.
//! The higher score wins; ties go to English.

use serde::Serialize;

use ruedas_core::model::{word_haystack, Language};
use ruedas_core::vocab::{
    has_phrase, ENGLISH_HINTS, ENGLISH_INDICATORS, SPANISH_HINTS, SPANISH_INDICATORS,
};

const ACCENT_WEIGHT: u32 = 2;
const INVERTED_PUNCTUATION_WEIGHT: u32 = 3;

/// Per-language scores behind a detection, for `explain` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LanguageScores {
    pub english: u32,
    pub spanish: u32,
}

impl LanguageScores {
    pub const fn language(self) -> Language {
        if self.spanish > self.english {
            Language::Es
        } else {
            Language::En
        }
    }
}

fn count_words(haystack: &str, words: &[&str]) -> u32 {
    words.iter().filter(|w| has_phrase(haystack, w)).count() as u32
}

/// Score a query for both languages.
pub fn score(text: &str) -> LanguageScores {
    let lowered = text.to_lowercase();
    let haystack = word_haystack(&lowered);

    let mut spanish =
        count_words(&haystack, SPANISH_INDICATORS) + count_words(&haystack, SPANISH_HINTS);
    let english =
        count_words(&haystack, ENGLISH_INDICATORS) + count_words(&haystack, ENGLISH_HINTS);

    if lowered.chars().any(|c| "áéíóúñü".contains(c)) {
        spanish += ACCENT_WEIGHT;
    }
    if lowered.chars().any(|c| c == '¿' || c == '¡') {
        spanish += INVERTED_PUNCTUATION_WEIGHT;
    }

    LanguageScores { english, spanish }
}

/// Detect the language of a query. Always returns a value.
pub fn detect(text: &str) -> Language {
    score(text).language()
}
