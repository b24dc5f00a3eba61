//! Tiered predicate construction.
//!
//! Each [`SearchTier`] trades precision for recall:
//!
//! - `OPTIMIZED`: one predicate per populated parameter.
//! - `SIMPLIFIED`: brand and model only, or query words longer than three
//!   characters matched against brand/model when neither was extracted.
//! - `KEYWORD`: any brand or model value (or any query word of three or
//!   more characters) matched loosely against brand or model.
//!
//! Every tier carries the location predicate and the row limit.

use ruedas_core::model::{fold_accents, ExtractedParameters, Query, SearchTier};
use ruedas_core::schema::{Column, Predicate, TierPlan};
use ruedas_core::vocab::{
    canonicalize, spellings_of, SynonymTable, BRANDS, COLORS, CONDITIONS, ENGINE_TYPES,
    FUEL_TYPES, STOP_WORDS, TRANSMISSIONS, VEHICLE_TYPES,
};

use crate::color::base_color;

const COLOR_COLUMNS: [Column; 2] = [Column::ExteriorColor, Column::InteriorColor];
const LOCATION_COLUMNS: [Column; 2] = [Column::Location, Column::Address];

#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    row_limit: u32,
}

impl QueryBuilder {
    pub const fn new(row_limit: u32) -> Self {
        Self { row_limit }
    }

    /// Plans for every tier, in execution order.
    pub fn build(&self, params: &ExtractedParameters, query: &Query) -> Vec<TierPlan> {
        SearchTier::ALL
            .iter()
            .map(|&tier| self.plan(tier, params, query))
            .collect()
    }

    pub fn plan(&self, tier: SearchTier, params: &ExtractedParameters, query: &Query) -> TierPlan {
        let mut plan = TierPlan::new(tier, self.row_limit);
        match tier {
            SearchTier::Optimized => optimized(&mut plan, params),
            SearchTier::Simplified => {
                if params.has_brand_or_model() {
                    push_brand(&mut plan, &params.brand);
                    push_model(&mut plan, &params.model);
                } else {
                    push_terms(&mut plan, &fallback_terms(query, 4));
                }
            }
            SearchTier::Keyword => {
                if params.has_brand_or_model() {
                    let values: Vec<String> =
                        params.brand.iter().chain(&params.model).cloned().collect();
                    push_terms(&mut plan, &values);
                } else {
                    push_terms(&mut plan, &fallback_terms(query, 3));
                }
            }
        }
        plan.push(location_predicate(&params.location));
        plan
    }
}

fn optimized(plan: &mut TierPlan, params: &ExtractedParameters) {
    push_brand(plan, &params.brand);
    push_model(plan, &params.model);

    if let Some(range) = params.year_range {
        if let Some(min) = range.min {
            plan.push(Predicate::AtLeast {
                column: Column::Year,
                value: f64::from(min),
            });
        }
        if let Some(max) = range.max {
            plan.push(Predicate::AtMost {
                column: Column::Year,
                value: f64::from(max),
            });
        }
    }

    if let Some(range) = params.price_range {
        if let Some(min) = range.min {
            plan.push(Predicate::AtLeast {
                column: Column::Price,
                value: min,
            });
        }
        if let Some(max) = range.max {
            plan.push(Predicate::AtMost {
                column: Column::Price,
                value: max,
            });
        }
    }

    if !params.vehicle_type.is_empty() {
        let spellings: Vec<String> = params
            .vehicle_type
            .iter()
            .flat_map(|t| spellings_of(VEHICLE_TYPES, t))
            .collect();
        plan.push(any_contains(&[Column::VehicleType], &spellings));
    }

    if let Some(engine) = &params.engine_specs {
        if let Some(cylinders) = engine.cylinders {
            plan.push(any_contains(&[Column::Engine], &cylinder_patterns(cylinders)));
        }
        if let Some(displacement) = &engine.displacement {
            let number = displacement.trim_end_matches(|c: char| c.is_alphabetic() || c == ' ');
            if !number.is_empty() {
                plan.push(Predicate::contains(Column::Engine, number));
            }
        }
        if let Some(engine_type) = &engine.engine_type {
            plan.push(synonym_predicate(Column::Engine, ENGINE_TYPES, engine_type));
        }
    }

    if let Some(transmission) = &params.transmission {
        plan.push(synonym_predicate(Column::Transmission, TRANSMISSIONS, transmission));
    }
    if let Some(fuel) = &params.fuel_type {
        plan.push(synonym_predicate(Column::FuelType, FUEL_TYPES, fuel));
    }
    if let Some(color) = &params.color {
        plan.push(any_contains(&COLOR_COLUMNS, &color_spellings(color)));
    }
    if let Some(condition) = &params.condition {
        plan.push(synonym_predicate(Column::Condition, CONDITIONS, condition));
    }
}

/// Free-text forms a cylinder count takes in engine descriptions.
pub fn cylinder_patterns(cylinders: u8) -> Vec<String> {
    vec![
        format!("{cylinders} cylinder"),
        format!("{cylinders}-cylinder"),
        format!("{cylinders} cyl"),
        format!("{cylinders} cilindro"),
        format!("v{cylinders}"),
    ]
}

/// Every spelling of a detected color, accounting for finish descriptors
/// (`"metallic red"` searches for red in any language).
pub fn color_spellings(color: &str) -> Vec<String> {
    if canonicalize(COLORS, color).is_some() {
        spellings_of(COLORS, color)
    } else {
        spellings_of(COLORS, base_color(color))
    }
}

fn push_brand(plan: &mut TierPlan, brands: &[String]) {
    if brands.is_empty() {
        return;
    }
    let mut predicates = Vec::new();
    for brand in brands {
        for spelling in spellings_of(BRANDS, brand) {
            predicates.push(Predicate::contains(Column::Brand, spelling));
        }
        predicates.push(Predicate::contains(Column::Model, brand.as_str()));
    }
    plan.push(Predicate::AnyOf { predicates });
}

fn push_model(plan: &mut TierPlan, models: &[String]) {
    if models.is_empty() {
        return;
    }
    plan.push(Predicate::AnyOf {
        predicates: models
            .iter()
            .map(|m| Predicate::fuzzy(Column::Model, m.as_str()))
            .collect(),
    });
}

/// Any term contained in brand, or similar to model.
fn push_terms(plan: &mut TierPlan, terms: &[String]) {
    if terms.is_empty() {
        return;
    }
    let predicates = terms
        .iter()
        .flat_map(|term| {
            [
                Predicate::contains(Column::Brand, term.as_str()),
                Predicate::fuzzy(Column::Model, term.as_str()),
            ]
        })
        .collect();
    plan.push(Predicate::AnyOf { predicates });
}

fn synonym_predicate(column: Column, table: &SynonymTable, value: &str) -> Predicate {
    any_contains(&[column], &spellings_of(table, value))
}

fn any_contains(columns: &[Column], values: &[String]) -> Predicate {
    let mut predicates = Vec::with_capacity(columns.len() * values.len());
    for value in values {
        for &column in columns {
            predicates.push(Predicate::contains(column, value.as_str()));
        }
    }
    Predicate::AnyOf { predicates }
}

/// Match the location in location or address. Accents and case are folded
/// on both sides by the store.
fn location_predicate(location: &str) -> Predicate {
    any_contains(&LOCATION_COLUMNS, &[location.trim().to_string()])
}

/// Query words usable as loose brand/model terms: not stop-words, not
/// numbers, at least `min_len` characters long.
pub fn fallback_terms(query: &Query, min_len: usize) -> Vec<String> {
    let stop_words: Vec<String> = STOP_WORDS.iter().map(|w| fold_accents(w)).collect();
    let mut terms: Vec<String> = Vec::new();
    for token in query.tokens() {
        if token.chars().count() < min_len
            || token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
            || stop_words.contains(&token)
            || terms.contains(&token)
        {
            continue;
        }
        terms.push(token);
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruedas_core::model::{Bounds, EngineSpecs, Language};

    fn params() -> ExtractedParameters {
        ExtractedParameters {
            location: "Puerto Rico".to_string(),
            ..ExtractedParameters::default()
        }
    }

    fn contains_value(predicate: &Predicate, wanted: &str) -> bool {
        match predicate {
            Predicate::Contains { value, .. } | Predicate::Fuzzy { value, .. } => value == wanted,
            Predicate::AnyOf { predicates } => predicates.iter().any(|p| contains_value(p, wanted)),
            _ => false,
        }
    }

    #[test]
    fn test_cylinder_predicate_forms() {
        let mut p = params();
        p.engine_specs = Some(EngineSpecs {
            cylinders: Some(8),
            ..EngineSpecs::default()
        });
        let query = Query::new("8 cylinder car", Language::En);
        let plan = QueryBuilder::new(15).plan(SearchTier::Optimized, &p, &query);

        // engine + location
        assert_eq!(plan.predicates.len(), 2);
        let engine = &plan.predicates[0];
        for form in ["8 cylinder", "8 cilindro", "v8"] {
            assert!(contains_value(engine, form), "missing {form}");
        }
        assert_eq!(plan.limit, 15);
    }

    #[test]
    fn test_optimized_has_one_predicate_per_field() {
        let mut p = params();
        p.brand = vec!["bmw".to_string()];
        p.price_range = Some(Bounds::new(None, Some(50_000.0)));
        p.year_range = Some(Bounds::new(Some(2018), Some(2020)));
        p.color = Some("red".to_string());
        let query = Query::new("red bmw 2018 to 2020 under $50,000", Language::En);
        let plan = QueryBuilder::new(15).plan(SearchTier::Optimized, &p, &query);

        // brand, year min, year max, price max, color, location
        assert_eq!(plan.predicates.len(), 6);
        assert!(plan.predicates.contains(&Predicate::AtMost {
            column: Column::Price,
            value: 50_000.0
        }));
        assert!(plan.predicates.iter().any(|p| contains_value(p, "rojo")));
    }

    #[test]
    fn test_every_tier_keeps_location() {
        let mut p = params();
        p.model = vec!["corolla".to_string()];
        let query = Query::new("corolla", Language::En);
        for plan in QueryBuilder::new(15).build(&p, &query) {
            let last = plan.predicates.last().unwrap();
            assert!(contains_value(last, "Puerto Rico"), "{:?}", plan.tier);
        }
    }

    #[test]
    fn test_simplified_drops_everything_but_brand_and_model() {
        let mut p = params();
        p.brand = vec!["toyota".to_string()];
        p.color = Some("red".to_string());
        p.fuel_type = Some("hybrid".to_string());
        let query = Query::new("red toyota hybrid", Language::En);
        let plan = QueryBuilder::new(15).plan(SearchTier::Simplified, &p, &query);
        assert_eq!(plan.predicates.len(), 2);
        assert!(contains_value(&plan.predicates[0], "toyota"));
    }

    #[test]
    fn test_simplified_without_brand_uses_long_words() {
        let p = params();
        let query = Query::new("8 cylinder electric car", Language::En);
        let plan = QueryBuilder::new(15).plan(SearchTier::Simplified, &p, &query);
        assert_eq!(plan.predicates.len(), 2);
        assert!(contains_value(&plan.predicates[0], "cylinder"));
        assert!(contains_value(&plan.predicates[0], "electric"));
        assert!(!contains_value(&plan.predicates[0], "car"));
    }

    #[test]
    fn test_keyword_ors_brand_and_model() {
        let mut p = params();
        p.brand = vec!["toyota".to_string()];
        p.model = vec!["supra".to_string()];
        let query = Query::new("toyota supra", Language::En);
        let plan = QueryBuilder::new(15).plan(SearchTier::Keyword, &p, &query);
        assert_eq!(plan.predicates.len(), 2);
        assert!(contains_value(&plan.predicates[0], "toyota"));
        assert!(contains_value(&plan.predicates[0], "supra"));
    }

    #[test]
    fn test_fallback_terms() {
        let query = Query::new("Busco un carro eléctrico 2020 con AWD", Language::Es);
        assert_eq!(fallback_terms(&query, 3), vec!["electrico", "awd"]);
        assert_eq!(fallback_terms(&query, 4), vec!["electrico"]);
    }

    #[test]
    fn test_color_spellings_drop_descriptor() {
        assert!(color_spellings("metallic red").contains(&"rojo".to_string()));
        assert!(color_spellings("pearl white").contains(&"blanco perla".to_string()));
    }

    #[test]
    fn test_location_checks_location_and_address() {
        let Predicate::AnyOf { predicates } = location_predicate(" Bayamón ") else {
            panic!("expected an OR group");
        };
        assert_eq!(
            predicates,
            vec![
                Predicate::contains(Column::Location, "Bayamón"),
                Predicate::contains(Column::Address, "Bayamón"),
            ]
        );
    }
}
