//! Dosage unit normalization and conversion
//!
//! Label text spells units many ways (`μg`, `ug`, `micrograms`, `International Units`).
//! Everything downstream compares the normalized spelling.

/// Units accepted on a label line (compared case-insensitively)
pub const RECOGNIZED_UNITS: &[&str] = &["mg", "mcg", "μg", "g", "iu", "ml", "%"];

/// Spelling variants mapped onto their canonical unit
const UNIT_ALIASES: &[(&str, &str)] = &[
    ("μg", "mcg"),
    ("µg", "mcg"),
    ("ug", "mcg"),
    ("microgram", "mcg"),
    ("micrograms", "mcg"),
    ("milligram", "mg"),
    ("milligrams", "mg"),
    ("gram", "g"),
    ("grams", "g"),
    ("international unit", "IU"),
    ("international units", "IU"),
    ("milliliter", "ml"),
    ("milliliters", "ml"),
];

/// Normalize a unit string: lowercase, alias table, `IU` uppercased.
///
/// Returns `None` for blank input.
pub fn normalize_unit(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    let lowered = collapsed.to_lowercase();

    if let Some((_, canonical)) = UNIT_ALIASES.iter().find(|(alias, _)| *alias == lowered) {
        return Some((*canonical).to_string());
    }
    if lowered == "iu" {
        return Some("IU".to_string());
    }
    Some(lowered)
}

/// True when the unit belongs to [`RECOGNIZED_UNITS`]
pub fn is_recognized_unit(unit: &str) -> bool {
    let lowered = unit.trim().to_lowercase();
    RECOGNIZED_UNITS.iter().any(|u| *u == lowered)
}

/// Micrograms per unit for mass units
fn mass_factor_mcg(unit: &str) -> Option<f64> {
    match unit {
        "g" => Some(1_000_000.0),
        "mg" => Some(1_000.0),
        "mcg" => Some(1.0),
        _ => None,
    }
}

/// Convert an amount between units.
///
/// Mass units (g/mg/mcg) convert freely; `IU` and `ml` only convert to
/// themselves. Returns `None` when the pair is incompatible.
pub fn convert_amount(amount: f64, from: &str, to: &str) -> Option<f64> {
    let from = normalize_unit(from)?;
    let to = normalize_unit(to)?;

    if from == to {
        return Some(amount);
    }

    match (mass_factor_mcg(&from), mass_factor_mcg(&to)) {
        (Some(from_factor), Some(to_factor)) => Some(amount * from_factor / to_factor),
        _ => None,
    }
}

/// True when an amount in `from` can be expressed in `to`
pub fn units_compatible(from: &str, to: &str) -> bool {
    convert_amount(1.0, from, to).is_some()
}
