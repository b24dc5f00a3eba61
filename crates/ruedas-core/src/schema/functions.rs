//! Scalar SQL functions registered on every inventory connection.
//!
//! - `safe_number(x)`: numeric value of a free-text column such as
//!   `"$18,500"` or `" 2019 "`; NULL when the text is not a number.
//! - `similarity(a, b)`: trigram similarity in `[0, 1]`, computed the way
//!   PostgreSQL's `pg_trgm` does (each word padded with two leading spaces
//!   and one trailing space).
//! - `fold(x)`: lowercase with accents removed, so `"BAYAMÓN"` and
//!   `"bayamon"` compare equal. SQLite's own `lower()` and `LIKE` only fold
//!   ASCII.

use std::collections::HashSet;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::model::fold_accents;

/// Minimum trigram similarity for a fuzzy model match.
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Register `safe_number`, `similarity` and `fold` on a connection.
pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("safe_number", 1, flags, |ctx| {
        Ok(match ctx.get_raw(0) {
            ValueRef::Integer(i) => Some(i as f64),
            ValueRef::Real(f) => Some(f),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().and_then(parse_number),
            ValueRef::Null | ValueRef::Blob(_) => None,
        })
    })?;

    conn.create_scalar_function("similarity", 2, flags, |ctx| {
        let a: Option<String> = ctx.get(0)?;
        let b: Option<String> = ctx.get(1)?;
        Ok(match (a, b) {
            (Some(a), Some(b)) => trigram_similarity(&a, &b),
            _ => 0.0,
        })
    })?;

    conn.create_scalar_function("fold", 1, flags, |ctx| {
        let text: Option<String> = ctx.get(0)?;
        Ok(text.map(|t| fold_text(&t)))
    })?;

    Ok(())
}

/// The Rust side of the `fold` SQL function.
#[must_use]
pub fn fold_text(text: &str) -> String {
    fold_accents(&text.to_lowercase())
}

/// Parse a loosely formatted number: `"$18,500"`, `"18500.00"`, `" 2019 "`.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '_'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let mut set = HashSet::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  ".chars().chain(word.chars()).chain(" ".chars()).collect();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }
    set
}

/// Trigram (Jaccard) similarity of two strings.
#[must_use]
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let total = left.union(&right).count();
    shared as f64 / total as f64
}
