//! Deterministic color detection.
//!
//! Looks up whole-word color names in the bilingual [`COLORS`] table and
//! finish descriptors in [`COLOR_DESCRIPTORS`]. Never consults the model.
//! Spellings in [`CONTEXT_ONLY_SPELLINGS`] count only when the query also
//! says "color", "pintura" or similar.

use ruedas_core::model::word_haystack;
use ruedas_core::vocab::{
    find_canonical, has_any, COLORS, COLOR_CONTEXT, COLOR_DESCRIPTORS, CONTEXT_ONLY_SPELLINGS,
};

/// Detect the color a query asks for.
///
/// - a color (longest match wins, so `"pearl white"` beats `"white"`)
///   together with a descriptor yields `"<descriptor> <color>"`;
/// - a color alone yields the canonical color;
/// - a descriptor alone yields the descriptor;
/// - otherwise `None`.
pub fn detect_color(text: &str) -> Option<String> {
    let mut haystack = word_haystack(text);
    if !has_any(&haystack, COLOR_CONTEXT) {
        haystack = without_context_only(&haystack);
    }
    let color = find_canonical(COLORS, &haystack);
    let descriptor = find_canonical(COLOR_DESCRIPTORS, &haystack);

    match (descriptor, color) {
        // The compound already carries its finish.
        (Some(d), Some(c)) if c.contains(d) => Some(c.to_string()),
        (Some(d), Some(c)) => Some(format!("{d} {c}")),
        (None, Some(c)) => Some(c.to_string()),
        (Some(d), None) => Some(d.to_string()),
        (None, None) => None,
    }
}

fn without_context_only(haystack: &str) -> String {
    let kept: Vec<&str> = haystack
        .split_whitespace()
        .filter(|word| !CONTEXT_ONLY_SPELLINGS.contains(word))
        .collect();
    format!(" {} ", kept.join(" "))
}

/// Split a detected color back into its base color, dropping any finish
/// descriptor (`"metallic red"` gives `"red"`).
pub fn base_color(color: &str) -> &str {
    for &(descriptor, _) in COLOR_DESCRIPTORS {
        if let Some(rest) = color.strip_prefix(descriptor) {
            let rest = rest.trim_start();
            if !rest.is_empty() {
                return rest;
            }
        }
    }
    color
}
