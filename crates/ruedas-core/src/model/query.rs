use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// The language a query was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    /// ISO 639-1 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Human-readable name, used when instructing the language model.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Spanish",
        }
    }

    /// Pick between an English and a Spanish rendering of the same text.
    #[must_use]
    pub fn pick<'a>(self, en: &'a str, es: &'a str) -> &'a str {
        match self {
            Self::En => en,
            Self::Es => es,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A user query as received, plus its normalized form and detected language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Text exactly as the user typed it.
    pub raw_text: String,

    /// Lowercased, trimmed, whitespace-collapsed text. Used as a cache key.
    pub normalized_text: String,

    pub language: Language,
}

impl Query {
    #[must_use]
    pub fn new(raw_text: impl Into<String>, language: Language) -> Self {
        let raw_text = raw_text.into();
        let normalized_text = normalize(&raw_text);
        Self {
            raw_text,
            normalized_text,
            language,
        }
    }

    /// Folded word tokens of the normalized text (see [`tokenize`]).
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        tokenize(&self.normalized_text)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalized_text.is_empty()
    }
}

/// Lowercase, trim, and collapse internal whitespace to single spaces.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip diacritics (`eléctrico` becomes `electrico`) so dictionary
/// matching does not depend on how carefully the user typed accents.
#[must_use]
pub fn fold_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Split text into lowercase, accent-folded alphanumeric words.
///
/// Punctuation separates words, except inside numbers (`5.0`, `50,000`),
/// where `.` and `,` are kept so that numeric tokens survive intact.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let folded = fold_accents(&text.to_lowercase());
    let chars: Vec<char> = folded.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let numeric_sep = (c == '.' || c == ',')
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(char::is_ascii_digit);
        if c.is_alphanumeric() || numeric_sep {
            current.push(c);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Render tokens as a space-padded string so that whole-word phrase lookups
/// reduce to a substring test on `" {phrase} "`.
#[must_use]
pub fn word_haystack(text: &str) -> String {
    format!(" {} ", tokenize(text).join(" "))
}
