use serde::{Deserialize, Serialize};

/// An inclusive numeric range where either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    #[must_use]
    pub const fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Swap the ends if they were given in the wrong order.
    #[must_use]
    pub fn ordered(self) -> Self {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Self {
                min: Some(max),
                max: Some(min),
            },
            _ => self,
        }
    }
}

pub type YearRange = Bounds<i32>;
pub type PriceRange = Bounds<f64>;

/// Engine characteristics named in a technical query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cylinders: Option<u8>,

    /// Displacement as written, e.g. `"5.0l"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displacement: Option<String>,

    /// Engine type descriptor, e.g. `"turbo"` or `"v8"`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub engine_type: Option<String>,
}

impl EngineSpecs {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cylinders.is_none() && self.displacement.is_none() && self.engine_type.is_none()
    }
}

/// Whether a query asks about mechanical specifications or is a general
/// shopping query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Technical,
    #[default]
    General,
}

/// Structured filters extracted from a free-text query.
///
/// Multi-valued fields (`brand`, `model`, `vehicle_type`) are OR-combined
/// when turned into predicates. `location` is never empty once the
/// extractor has finished with it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedParameters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brand: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub model: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_range: Option<YearRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vehicle_type: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_specs: Option<EngineSpecs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default)]
    pub location: String,
}

impl ExtractedParameters {
    /// Fill in `location` with the market default when nothing was extracted.
    pub fn ensure_location(&mut self, default_location: &str) {
        if self.location.trim().is_empty() {
            default_location.trim().clone_into(&mut self.location);
        }
    }

    #[must_use]
    pub fn has_brand_or_model(&self) -> bool {
        !self.brand.is_empty() || !self.model.is_empty()
    }

    /// True when no filter besides location was extracted.
    #[must_use]
    pub fn has_no_filters(&self) -> bool {
        !self.has_brand_or_model()
            && self.year_range.is_none_or(|r| r.is_open())
            && self.price_range.is_none_or(|r| r.is_open())
            && self.vehicle_type.is_empty()
            && self.engine_specs.as_ref().is_none_or(EngineSpecs::is_empty)
            && self.transmission.is_none()
            && self.fuel_type.is_none()
            && self.color.is_none()
            && self.condition.is_none()
    }

    #[must_use]
    pub fn has_engine_specs(&self) -> bool {
        self.engine_specs.as_ref().is_some_and(|e| !e.is_empty())
    }
}
