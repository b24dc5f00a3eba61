//! Deterministic extraction from dictionaries and patterns.
//!
//! Runs on accent-folded, lowercased text so Spanish keywords match with
//! or without their accents. Everything here is pure and synchronous.

use std::sync::LazyLock;

use regex::Regex;

use ruedas_core::model::{
    fold_accents, tokenize, word_haystack, Bounds, EngineSpecs, ExtractedParameters,
};
use ruedas_core::vocab::{
    brand_for_model, find_all_canonical, find_canonical, has_any, has_phrase, BRANDS,
    CONDITIONS, ENGINE_TYPES, FUEL_TYPES, LOCATIONS, MODELS, TECHNICAL_KEYWORDS, TRANSMISSIONS,
    VEHICLE_TYPES,
};

use crate::color::detect_color;

const YEAR: &str = r"((?:19|20)\d{2})";

static YEAR_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b{YEAR}\s*(?:-|to|and|y|a|al|hasta|through)\s*{YEAR}\b"))
        .expect("year range regex is valid")
});

static YEAR_MIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:after|since|newer than|from|desde|despues de|despues del|a partir de|a partir del)\s+{YEAR}\b|\b{YEAR}\s*(?:\+|or newer|or later|and up|en adelante|o mas nuevo)"
    ))
    .expect("minimum year regex is valid")
});

static YEAR_MAX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:before|older than|until|up to|antes de|antes del|hasta el|hasta)\s+{YEAR}\b|\b{YEAR}\s*(?:or older|or earlier|o mas viejo|o anterior)"
    ))
    .expect("maximum year regex is valid")
});

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b{YEAR}\b")).expect("year regex is valid"));

static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$\s*)?(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)\s*(k\b|mil\b|thousand\b|grand\b)?")
        .expect("money regex is valid")
});

static CYLINDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\s*-?\s*(?:cyl|cyls|cylinder|cylinders|cilindro|cilindros)\b")
        .expect("cylinder regex is valid")
});

static V_ENGINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bv-?(4|6|8|10|12)\b").expect("v-engine regex is valid"));

static DISPLACEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}\.\d)\s*-?\s*(?:l|lt|liter|liters|litre|litres|litro|litros)\b")
        .expect("displacement regex is valid")
});

/// Words after a number that make it a mileage, size or count, not a price.
const NON_PRICE_UNITS: &[&str] = &[
    "miles", "millas", "mi", "km", "kilometros", "kilometers", "cc", "hp", "cyl", "cylinder",
    "cylinders", "cilindro", "cilindros", "l", "liter", "litros", "doors", "puertas", "seats",
    "asientos",
];

const MAX_PRICE_WORDS: &[&str] = &[
    "under", "below", "less than", "up to", "max", "maximum", "no more than", "within",
    "budget", "menos de", "hasta", "maximo", "bajo", "por debajo de", "presupuesto",
];

const MIN_PRICE_WORDS: &[&str] = &[
    "over", "above", "more than", "at least", "starting at", "from", "mas de", "desde",
    "minimo", "por encima de", "sobre",
];

const LOCATION_PREFIXES: &[&str] = &["in", "near", "around", "en", "cerca de", "por"];

/// Parameters recovered by the rules, plus whether the query reads as a
/// technical (engine specification) search.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleExtraction {
    pub params: ExtractedParameters,
    pub is_technical: bool,
}

/// Extract parameters from a normalized query without any model call.
pub fn extract(text: &str) -> RuleExtraction {
    let folded = fold_accents(&text.to_lowercase());
    let haystack = word_haystack(&folded);

    let (brand, model) = brands_and_models(&haystack);
    let engine_specs = engine_specs(&folded, &haystack);

    let params = ExtractedParameters {
        brand,
        model,
        year_range: year_range(&folded),
        price_range: price_range(&folded),
        vehicle_type: find_all_canonical(VEHICLE_TYPES, &haystack)
            .into_iter()
            .map(str::to_string)
            .collect(),
        engine_specs: (!engine_specs.is_empty()).then_some(engine_specs),
        transmission: find_canonical(TRANSMISSIONS, &haystack).map(str::to_string),
        fuel_type: find_canonical(FUEL_TYPES, &haystack).map(str::to_string),
        color: detect_color(&folded),
        condition: find_canonical(CONDITIONS, &haystack).map(str::to_string),
        location: location(&haystack).unwrap_or_default(),
    };

    let is_technical = has_any(&haystack, TECHNICAL_KEYWORDS) || params.has_engine_specs();
    RuleExtraction {
        params,
        is_technical,
    }
}

fn brands_and_models(haystack: &str) -> (Vec<String>, Vec<String>) {
    let mut brands: Vec<String> = find_all_canonical(BRANDS, haystack)
        .into_iter()
        .map(str::to_string)
        .collect();

    let matched: Vec<&str> = MODELS
        .iter()
        .map(|&(model, _)| model)
        .filter(|model| has_phrase(haystack, model))
        .collect();

    // "grand cherokee" also contains "cherokee"; keep only the longer name.
    let padded = |name: &str| format!(" {} ", tokenize(name).join(" "));
    let models: Vec<String> = matched
        .iter()
        .filter(|&&model| {
            !matched
                .iter()
                .any(|&other| other != model && padded(other).contains(&padded(model)))
        })
        .map(|model| (*model).to_string())
        .collect();

    for model in &models {
        if let Some(brand) = brand_for_model(model) {
            if !brands.iter().any(|b| b == brand) {
                brands.push(brand.to_string());
            }
        }
    }

    (brands, models)
}

fn parse_year(text: &str) -> Option<i32> {
    text.parse().ok()
}

fn year_range(text: &str) -> Option<Bounds<i32>> {
    if let Some(caps) = YEAR_RANGE_RE.captures(text) {
        let min = caps.get(1).and_then(|m| parse_year(m.as_str()));
        let max = caps.get(2).and_then(|m| parse_year(m.as_str()));
        return Some(Bounds::new(min, max).ordered());
    }

    let first_year = |re: &Regex| {
        re.captures(text).and_then(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .find_map(|m| parse_year(m.as_str()))
        })
    };
    let min = first_year(&YEAR_MIN_RE);
    let max = first_year(&YEAR_MAX_RE);
    if min.is_some() || max.is_some() {
        return Some(Bounds::new(min, max).ordered());
    }

    let years: Vec<i32> = YEAR_RE
        .find_iter(text)
        .filter(|m| !preceded_by_dollar(text, m.start()))
        .filter_map(|m| parse_year(m.as_str()))
        .collect();
    let min = years.iter().min().copied()?;
    let max = years.iter().max().copied()?;
    Some(Bounds::new(Some(min), Some(max)))
}

fn preceded_by_dollar(text: &str, start: usize) -> bool {
    text[..start].trim_end().ends_with('$')
}

/// The last `chars` characters of `text`.
fn tail(text: &str, chars: usize) -> &str {
    let start = text
        .char_indices()
        .rev()
        .nth(chars.saturating_sub(1))
        .map_or(0, |(i, _)| i);
    &text[start..]
}

/// Position just past the last occurrence of any phrase in `window`.
fn last_phrase_end(window: &str, phrases: &[&str]) -> Option<usize> {
    let haystack = word_haystack(window);
    phrases
        .iter()
        .filter_map(|phrase| {
            let needle = format!(" {} ", tokenize(phrase).join(" "));
            haystack.rfind(&needle).map(|i| i + needle.len())
        })
        .max()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PriceSide {
    Min,
    Max,
}

fn price_range(text: &str) -> Option<Bounds<f64>> {
    let mut amounts: Vec<(f64, PriceSide)> = Vec::new();

    for caps in MONEY_RE.captures_iter(text) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let has_dollar = caps.get(1).is_some();
        let unit = caps.get(3).map(|m| m.as_str());

        let after = text[whole.end()..].trim_start();
        let next_word = after
            .split(|c: char| !c.is_alphanumeric())
            .next()
            .unwrap_or_default();
        if NON_PRICE_UNITS.contains(&next_word) {
            continue;
        }

        let Ok(mut value) = number.as_str().replace(',', "").parse::<f64>() else {
            continue;
        };
        if unit.is_some() {
            value *= 1_000.0;
        }

        let before = tail(&text[..whole.start()], 24);
        let max_at = last_phrase_end(before, MAX_PRICE_WORDS);
        let min_at = last_phrase_end(before, MIN_PRICE_WORDS);
        let keyword = max_at.is_some() || min_at.is_some();

        let bare_year = !has_dollar
            && unit.is_none()
            && !number.as_str().contains(',')
            && (1900.0..=2100.0).contains(&value);
        let is_price = has_dollar || unit.is_some() || (keyword && value >= 1_000.0 && !bare_year);
        if !is_price {
            continue;
        }

        let side = match (min_at, max_at) {
            (Some(min), Some(max)) if min > max => PriceSide::Min,
            (Some(_), None) => PriceSide::Min,
            _ => PriceSide::Max,
        };
        amounts.push((value, side));
    }

    match amounts.as_slice() {
        [] => None,
        [(value, PriceSide::Max)] => Some(Bounds::new(None, Some(*value))),
        [(value, PriceSide::Min)] => Some(Bounds::new(Some(*value), None)),
        many => {
            let min = many.iter().map(|(v, _)| *v).fold(f64::INFINITY, f64::min);
            let max = many.iter().map(|(v, _)| *v).fold(f64::NEG_INFINITY, f64::max);
            Some(Bounds::new(Some(min), Some(max)))
        }
    }
}

fn engine_specs(text: &str, haystack: &str) -> EngineSpecs {
    let cylinders = CYLINDER_RE
        .captures(text)
        .or_else(|| V_ENGINE_RE.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .filter(|n| (1..=16).contains(n));

    let displacement = DISPLACEMENT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("{}L", m.as_str()));

    EngineSpecs {
        cylinders,
        displacement,
        engine_type: find_canonical(ENGINE_TYPES, haystack).map(str::to_string),
    }
}

fn location(haystack: &str) -> Option<String> {
    LOCATIONS
        .iter()
        .find(|place| {
            LOCATION_PREFIXES
                .iter()
                .any(|prefix| has_phrase(haystack, &format!("{prefix} {place}")))
        })
        .map(|place| (*place).to_string())
}
