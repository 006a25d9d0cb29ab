//! Amount, unit, %DV and name cleanup for single label cells

use labelcheck_common::units::normalize_unit;
use once_cell::sync::Lazy;
use regex::Regex;

static COMPARISON_GLYPHS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<>≤≥]").unwrap());

static LEADING_AMOUNT_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?|\.\d+)\s*([a-zA-Zμµ]+(?:\s+(?i:units?))?)").unwrap()
});

static TRAILING_AMOUNT_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s+(\d[\d,]*\.?\d*)\s*([a-zA-Zμ%]+)\s*$").unwrap());

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

const FOOTNOTE_GLYPHS: &[char] = &['†', '*', '‡', '§'];

/// Parse a leading `<number><unit>` amount.
///
/// Comparison glyphs and thousands separators are stripped first; no match
/// yields `(None, None)`.
pub fn parse_amount_and_unit(text: &str) -> (Option<f64>, Option<String>) {
    let stripped = COMPARISON_GLYPHS.replace_all(text, "").replace(',', "");

    let Some(caps) = LEADING_AMOUNT_UNIT.captures(&stripped) else {
        return (None, None);
    };
    let amount = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
    let unit = caps.get(2).and_then(|m| normalize_unit(m.as_str()));

    match (amount, unit) {
        (Some(amount), Some(unit)) => (Some(amount), Some(unit)),
        _ => (None, None),
    }
}

/// Extract the first integer of a %DV cell after stripping `%`, `†`, `*`
pub fn parse_dv_percent(text: &str) -> Option<u32> {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '%' | '†' | '*'))
        .collect();
    FIRST_INTEGER
        .find(&stripped)
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Strip footnote glyphs and trim. Names shorter than 2 characters are rejected.
pub fn clean_name(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| !FOOTNOTE_GLYPHS.contains(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.chars().count() < 2 {
        return None;
    }
    Some(cleaned.to_string())
}

/// Split a single-cell line into name and trailing amount/unit.
///
/// Returns `None` when the line carries no trailing amount.
pub fn split_trailing_amount(line: &str) -> Option<(String, f64, String)> {
    let caps = TRAILING_AMOUNT_UNIT.captures(line.trim())?;
    let name = caps.get(1)?.as_str().to_string();
    let amount = caps.get(2)?.as_str().replace(',', "").parse::<f64>().ok()?;
    let unit = normalize_unit(caps.get(3)?.as_str())?;
    Some((name, amount, unit))
}
