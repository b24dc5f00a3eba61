//! Model-backed extraction: prompt and validated response parsing.
//!
//! The model is asked for one JSON object. Its answer is never trusted
//! as-is: each known field is coerced into its typed form (numbers may
//! arrive as `"$50,000"` or `"50k"`, lists as a single string) and any
//! value of the wrong shape rejects the whole answer so that extraction
//! falls through to the rules.

use chrono::Datelike;
use serde_json::{Map, Value};

use ruedas_core::model::{Bounds, EngineSpecs, ExtractedParameters, Language, QueryType};
use ruedas_core::schema::parse_number;

use crate::error::SearchError;

pub(crate) const EXTRACTION_PROMPT: &str = r#"You extract vehicle search filters from a shopper's query. The query may be in English or Spanish.
Return ONLY a JSON object with these keys (omit or use null for anything not mentioned):
{
  "brand": string or array of strings (lowercase make, e.g. "toyota"),
  "model": string or array of strings (lowercase model, e.g. "corolla"),
  "year_range": {"min": integer, "max": integer},
  "price_range": {"min": number, "max": number} (US dollars),
  "vehicle_type": string or array of strings (sedan, suv, truck, coupe, convertible, hatchback, minivan, van, wagon),
  "engine_specs": {"cylinders": integer, "displacement": string, "type": string},
  "transmission": "automatic" | "manual" | "cvt",
  "fuel_type": "gasoline" | "diesel" | "hybrid" | "electric",
  "color": string (English color name),
  "condition": "new" | "used" | "certified",
  "location": string (city or region, only if the shopper names one),
  "query_type": "technical" | "general",
  "is_technical_search": boolean
}
A query is technical when it asks about engine or mechanical specifications (cylinders, displacement, horsepower, engine type).
Translate Spanish values to English. Never invent filters the query does not state."#;

/// What a validated model answer yields.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelExtraction {
    pub params: ExtractedParameters,
    pub query_type: Option<QueryType>,
    pub is_technical_search: Option<bool>,
}

pub(crate) fn user_message(query: &str, language: Language) -> String {
    format!("Query ({}): {}", language.name(), query)
}

type Violation = String;

/// Parse and validate the model's JSON answer.
pub fn parse_response(text: &str) -> Result<ModelExtraction, SearchError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| SearchError::ExtractionParseError(format!("invalid JSON: {e}")))?;
    let Value::Object(map) = value else {
        return Err(SearchError::ExtractionParseError(
            "expected a JSON object".to_string(),
        ));
    };
    validate(&map).map_err(SearchError::ExtractionParseError)
}

/// Validate a parameters object embedded in some other model answer.
pub(crate) fn parameters_from_value(value: &Value) -> Result<ExtractedParameters, Violation> {
    match value {
        Value::Object(map) => validate(map).map(|parsed| parsed.params),
        other => Err(format!("expected a parameters object, got {other}")),
    }
}

fn validate(map: &Map<String, Value>) -> Result<ModelExtraction, Violation> {
    let params = ExtractedParameters {
        brand: string_list(map, "brand")?,
        model: string_list(map, "model")?,
        year_range: year_range(map.get("year_range"))?,
        price_range: price_range(map.get("price_range"))?,
        vehicle_type: string_list(map, "vehicle_type")?,
        engine_specs: engine_specs(map.get("engine_specs"))?,
        transmission: string_field(map, "transmission")?,
        fuel_type: string_field(map, "fuel_type")?,
        color: string_field(map, "color")?,
        condition: string_field(map, "condition")?,
        location: string_field(map, "location")?
            .map(|l| title_case(&l))
            .unwrap_or_default(),
    };

    let query_type = match string_field(map, "query_type")?.as_deref() {
        None => None,
        Some("technical") => Some(QueryType::Technical),
        Some("general") => Some(QueryType::General),
        Some(other) => return Err(format!("unknown query_type {other:?}")),
    };

    let is_technical_search = match map.get("is_technical_search") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Some(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Some(false),
        Some(other) => return Err(format!("is_technical_search is not a boolean: {other}")),
    };

    Ok(ModelExtraction {
        params,
        query_type,
        is_technical_search,
    })
}

fn clean(text: &str) -> Option<String> {
    let trimmed = text.trim().to_lowercase();
    match trimmed.as_str() {
        "" | "null" | "none" | "n/a" | "any" => None,
        _ => Some(trimmed),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Result<Option<String>, Violation> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(clean(s)),
        Some(other) => Err(format!("{key} is not a string: {other}")),
    }
}

fn string_list(map: &Map<String, Value>, key: &str) -> Result<Vec<String>, Violation> {
    let mut values = match map.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => clean(s).into_iter().collect(),
        Some(Value::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => values.extend(clean(s)),
                    Value::Null => {}
                    other => return Err(format!("{key} contains a non-string: {other}")),
                }
            }
            values
        }
        Some(other) => return Err(format!("{key} is not a string or list: {other}")),
    };
    values.dedup();
    Ok(values)
}

fn number(value: &Value, field: &str) -> Result<Option<f64>, Violation> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => {
            let lowered = s.trim().to_lowercase();
            if clean(&lowered).is_none() {
                return Ok(None);
            }
            let (digits, scale) = match lowered.strip_suffix('k') {
                Some(rest) => (rest, 1_000.0),
                None => (lowered.as_str(), 1.0),
            };
            parse_number(digits)
                .map(|n| Some(n * scale))
                .ok_or_else(|| format!("{field} is not a number: {s:?}"))
        }
        other => Err(format!("{field} is not a number: {other}")),
    }
}

fn range_object<'a>(
    value: Option<&'a Value>,
    field: &str,
) -> Result<Option<&'a Map<String, Value>>, Violation> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(format!("{field} is not an object: {other}")),
    }
}

fn bound(map: &Map<String, Value>, key: &str, field: &str) -> Result<Option<f64>, Violation> {
    map.get(key)
        .map_or(Ok(None), |v| number(v, &format!("{field}.{key}")))
}

fn year_range(value: Option<&Value>) -> Result<Option<Bounds<i32>>, Violation> {
    let Some(map) = range_object(value, "year_range")? else {
        return Ok(None);
    };
    let latest = chrono::Utc::now().year() + 2;
    let as_year = |n: Option<f64>, key: &str| -> Result<Option<i32>, Violation> {
        match n {
            None => Ok(None),
            Some(n)
                if n.fract().abs() < f64::EPSILON
                    && (1900.0..=f64::from(latest)).contains(&n) =>
            {
                Ok(Some(n as i32))
            }
            Some(n) => Err(format!("year_range.{key} out of range: {n}")),
        }
    };
    let min = as_year(bound(map, "min", "year_range")?, "min")?;
    let max = as_year(bound(map, "max", "year_range")?, "max")?;
    let range = Bounds::new(min, max).ordered();
    Ok((!range.is_open()).then_some(range))
}

fn price_range(value: Option<&Value>) -> Result<Option<Bounds<f64>>, Violation> {
    let Some(map) = range_object(value, "price_range")? else {
        return Ok(None);
    };
    let check = |n: Option<f64>, key: &str| match n {
        Some(n) if !n.is_finite() || n < 0.0 => Err(format!("price_range.{key} invalid: {n}")),
        // A zero bound carries no information.
        Some(n) if n <= 0.0 => Ok(None),
        other => Ok(other),
    };
    let min = check(bound(map, "min", "price_range")?, "min")?;
    let max = check(bound(map, "max", "price_range")?, "max")?;
    let range = Bounds::new(min, max).ordered();
    Ok((!range.is_open()).then_some(range))
}

fn engine_specs(value: Option<&Value>) -> Result<Option<EngineSpecs>, Violation> {
    let Some(map) = range_object(value, "engine_specs")? else {
        return Ok(None);
    };

    let cylinders = match map.get("cylinders") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            if digits.is_empty() {
                None
            } else {
                Some(digits.parse::<u8>().map_err(|_| format!("cylinders invalid: {s:?}"))?)
            }
        }
        Some(Value::Number(n)) => Some(
            n.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| format!("cylinders invalid: {n}"))?,
        ),
        Some(other) => return Err(format!("cylinders is not a number: {other}")),
    };
    if let Some(n) = cylinders {
        if !(1..=16).contains(&n) {
            return Err(format!("cylinders out of range: {n}"));
        }
    }

    let specs = EngineSpecs {
        cylinders,
        displacement: string_field(map, "displacement")?,
        engine_type: string_field(map, "type")?,
    };
    Ok((!specs.is_empty()).then_some(specs))
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
