//! Filter predicates over the inventory schema.
//!
//! Predicates only ever name columns from the [`Column`] allow-list and only
//! ever carry user text as bound parameters. [`TierPlan::to_sql`] renders a
//! plan into a statement with `?N` placeholders plus the values to bind.

use rusqlite::types::Value;
use serde::Serialize;

use crate::model::SearchTier;

use super::functions::{fold_text, SIMILARITY_THRESHOLD};

/// Inventory columns a predicate may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Brand,
    Model,
    Year,
    Price,
    ExteriorColor,
    InteriorColor,
    Transmission,
    FuelType,
    Engine,
    VehicleType,
    Condition,
    Location,
    Address,
}

impl Column {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Model => "model",
            Self::Year => "year",
            Self::Price => "price",
            Self::ExteriorColor => "exterior_color",
            Self::InteriorColor => "interior_color",
            Self::Transmission => "transmission",
            Self::FuelType => "fuel_type",
            Self::Engine => "engine",
            Self::VehicleType => "vehicle_type",
            Self::Condition => "condition",
            Self::Location => "location",
            Self::Address => "address",
        }
    }
}

/// A single boolean condition on a vehicle row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Case- and accent-insensitive substring match.
    Contains { column: Column, value: String },
    /// Substring match, or trigram similarity above the threshold.
    Fuzzy { column: Column, value: String },
    /// Numeric lower bound on a text-typed column.
    AtLeast { column: Column, value: f64 },
    /// Numeric upper bound on a text-typed column.
    AtMost { column: Column, value: f64 },
    /// True when any member is true. An empty group is false.
    AnyOf { predicates: Vec<Predicate> },
}

impl Predicate {
    #[must_use]
    pub fn contains(column: Column, value: impl Into<String>) -> Self {
        Self::Contains {
            column,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn fuzzy(column: Column, value: impl Into<String>) -> Self {
        Self::Fuzzy {
            column,
            value: value.into(),
        }
    }

    fn render(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Self::Contains { column, value } => {
                params.push(Value::Text(like_pattern(value)));
                sql.push_str(&format!(
                    "fold({}) LIKE ?{} ESCAPE '\\'",
                    column.as_sql(),
                    params.len()
                ));
            }
            Self::Fuzzy { column, value } => {
                params.push(Value::Text(like_pattern(value)));
                let like_idx = params.len();
                params.push(Value::Text(fold_text(value)));
                let sim_idx = params.len();
                params.push(Value::Real(SIMILARITY_THRESHOLD));
                let threshold_idx = params.len();
                let col = column.as_sql();
                sql.push_str(&format!(
                    "(fold({col}) LIKE ?{like_idx} ESCAPE '\\' \
                     OR similarity(fold({col}), ?{sim_idx}) >= ?{threshold_idx})"
                ));
            }
            Self::AtLeast { column, value } => {
                params.push(Value::Real(*value));
                sql.push_str(&format!(
                    "safe_number({}) >= ?{}",
                    column.as_sql(),
                    params.len()
                ));
            }
            Self::AtMost { column, value } => {
                params.push(Value::Real(*value));
                sql.push_str(&format!(
                    "safe_number({}) <= ?{}",
                    column.as_sql(),
                    params.len()
                ));
            }
            Self::AnyOf { predicates } => {
                if predicates.is_empty() {
                    sql.push('0');
                    return;
                }
                sql.push('(');
                for (i, predicate) in predicates.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" OR ");
                    }
                    predicate.render(sql, params);
                }
                sql.push(')');
            }
        }
    }
}

/// Build a `LIKE` pattern matching folded `value` anywhere, with wildcards
/// escaped.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in fold_text(value).chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Columns read back for every match, in [`VehicleRecord`] order.
///
/// [`VehicleRecord`]: crate::model::VehicleRecord
pub const SELECT_COLUMNS: &str = "id, brand, model, CAST(safe_number(year) AS INTEGER), \
     safe_number(price), exterior_color, interior_color, transmission, fuel_type, engine, \
     vehicle_type, condition, mileage, location, address";

/// The predicates of one search tier, AND-combined, plus its row limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierPlan {
    pub tier: SearchTier,
    pub predicates: Vec<Predicate>,
    pub limit: u32,
}

impl TierPlan {
    #[must_use]
    pub const fn new(tier: SearchTier, limit: u32) -> Self {
        Self {
            tier,
            predicates: Vec::new(),
            limit,
        }
    }

    #[must_use]
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    /// Render the plan as a parameterized `SELECT` and its bound values.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM vehicles");
        let mut params = Vec::new();
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            for (i, predicate) in self.predicates.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" AND ");
                }
                predicate.render(&mut sql, &mut params);
            }
        }
        params.push(Value::Integer(i64::from(self.limit)));
        sql.push_str(&format!(" ORDER BY id DESC LIMIT ?{}", params.len()));
        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("BMW"), "%bmw%");
        assert_eq!(like_pattern("Bayamón"), "%bayamon%");
    }

    #[test]
    fn test_to_sql_binds_every_value() {
        let plan = TierPlan::new(SearchTier::Optimized, 15)
            .with(Predicate::contains(Column::Brand, "BMW"))
            .with(Predicate::AtMost {
                column: Column::Price,
                value: 50_000.0,
            });
        let (sql, params) = plan.to_sql();
        assert!(sql.contains("fold(brand) LIKE ?1"));
        assert!(sql.contains("safe_number(price) <= ?2"));
        assert!(sql.ends_with("ORDER BY id DESC LIMIT ?3"));
        assert!(!sql.contains("bmw"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[0], Value::Text("%bmw%".to_string()));
        assert_eq!(params[1], Value::Real(50_000.0));
        assert_eq!(params[2], Value::Integer(15));
    }

    #[test]
    fn test_injection_text_is_never_interpolated() {
        let plan = TierPlan::new(SearchTier::Keyword, 15)
            .with(Predicate::contains(Column::Model, "x'); DROP TABLE vehicles; --"));
        let (sql, params) = plan.to_sql();
        assert!(!sql.contains("DROP"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_any_of_renders_or_group() {
        let plan = TierPlan::new(SearchTier::Simplified, 5).with(Predicate::AnyOf {
            predicates: vec![
                Predicate::contains(Column::Location, "San Juan"),
                Predicate::contains(Column::Address, "San Juan"),
            ],
        });
        let (sql, _) = plan.to_sql();
        assert!(sql.contains("(fold(location) LIKE ?1 ESCAPE '\\' OR fold(address) LIKE ?2"));
    }

    #[test]
    fn test_empty_any_of_is_false() {
        let plan = TierPlan::new(SearchTier::Keyword, 5)
            .with(Predicate::AnyOf { predicates: vec![] });
        let (sql, params) = plan.to_sql();
        assert!(sql.contains("WHERE 0"));
        assert_eq!(params.len(), 1);
    }
}
