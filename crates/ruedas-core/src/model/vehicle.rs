use serde::{Deserialize, Serialize};

/// A read-only projection of one inventory listing.
///
/// The column set is owned by the inventory store; this type only mirrors
/// what the search pipeline reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleRecord {
    #[serde(default)]
    pub id: i64,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub exterior_color: Option<String>,
    #[serde(default)]
    pub interior_color: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    /// Free-text engine description, e.g. `"5.0L V8"` or `"2.0 4 cilindros"`.
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub mileage: Option<i64>,
    pub location: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl VehicleRecord {
    #[must_use]
    pub fn new(
        brand: impl Into<String>,
        model: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            location: location.into(),
            ..Default::default()
        }
    }

    /// One-line description used in prompts and templated responses,
    /// e.g. `"2019 Toyota Corolla, red, $18,500"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        let title = match self.year {
            Some(year) => format!("{year} {} {}", self.brand, self.model),
            None => format!("{} {}", self.brand, self.model),
        };
        parts.push(title.trim().to_string());
        if let Some(color) = &self.exterior_color {
            parts.push(color.clone());
        }
        if let Some(engine) = &self.engine {
            parts.push(engine.clone());
        }
        if let Some(price) = self.price {
            parts.push(format_price(price));
        }
        parts.join(", ")
    }
}

/// Format a price as whole dollars with thousands separators.
#[must_use]
pub fn format_price(price: f64) -> String {
    let whole = price.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
