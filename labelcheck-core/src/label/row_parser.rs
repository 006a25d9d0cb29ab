//! Ingredient Row Parser
//!
//! Turns the cells of each clustered row into a candidate ingredient.
//!
//! **Per label:**
//! 1. Detect the serving-size line (never counted as a header)
//! 2. Detect the table header; a missing header is reported, not fatal
//! 3. Skip non-ingredient lines (footnotes, warnings, "Other ingredients", ...)
//! 4. Parse every remaining row by column count (3+, 2, or 1 cell)

use super::amount::{clean_name, parse_amount_and_unit, parse_dv_percent, split_trailing_amount};
use crate::models::{Cell, IssueKind, ParsedIngredient, ValidationIssue};
use once_cell::sync::Lazy;
use regex::Regex;

static SERVING_SIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)serving\s*size").unwrap());
static SERVINGS_PER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)servings?\s*per").unwrap());

static NON_INGREDIENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)other\s+ingredients|daily\s+value|^\s*[†*‡§]|suggested\s+use|warning|allergen|manufactured|not\s+a\s+significant|supplement\s+facts",
    )
    .unwrap()
});

const AMOUNT_MARKERS: &[&str] = &["amount", "per serving"];
const DAILY_VALUE_MARKERS: &[&str] = &["%dv", "daily value", "dv"];
const GENERIC_HEADER_KEYWORDS: &[&str] = &["amount", "daily value", "%dv", "dv", "per serving"];

fn row_text(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn is_serving_line(text: &str) -> bool {
    SERVING_SIZE.is_match(text) || SERVINGS_PER.is_match(text)
}

/// Locate the table header row.
///
/// Preferred: ≥2 cells mentioning both an amount marker and a daily-value
/// marker. Fallback: ≥3 cells mentioning any generic header keyword.
/// Serving-size lines never qualify.
pub fn detect_header(rows: &[Vec<Cell>]) -> Option<usize> {
    let texts: Vec<String> = rows.iter().map(|r| row_text(r).to_lowercase()).collect();

    let primary = rows.iter().zip(&texts).position(|(cells, text)| {
        cells.len() >= 2
            && !is_serving_line(text)
            && contains_any(text, AMOUNT_MARKERS)
            && contains_any(text, DAILY_VALUE_MARKERS)
    });
    if primary.is_some() {
        return primary;
    }

    rows.iter().zip(&texts).position(|(cells, text)| {
        cells.len() >= 3 && !is_serving_line(text) && contains_any(text, GENERIC_HEADER_KEYWORDS)
    })
}

/// Find the serving size text.
///
/// A `Serving Size` line yields the text after the marker; a
/// `Servings Per Container` line is used only when no serving-size line exists.
pub fn detect_serving_size(rows: &[Vec<Cell>]) -> Option<String> {
    let texts: Vec<String> = rows.iter().map(|r| row_text(r)).collect();

    for text in &texts {
        if let Some(m) = SERVING_SIZE.find(text) {
            let rest = text[m.end()..].trim_start_matches(|c: char| c == ':' || c.is_whitespace());
            let rest = rest.trim();
            return Some(if rest.is_empty() { text.trim().to_string() } else { rest.to_string() });
        }
    }

    texts
        .iter()
        .find(|t| SERVINGS_PER.is_match(t))
        .map(|t| t.trim().to_string())
}

/// True for lines that are never ingredients
pub fn is_non_ingredient_row(text: &str) -> bool {
    NON_INGREDIENT.is_match(text)
}

fn mean_confidence(cells: &[&Cell]) -> f64 {
    if cells.is_empty() {
        return 0.0;
    }
    cells.iter().map(|c| c.confidence).sum::<f64>() / cells.len() as f64
}

/// Parse one row's cells into an ingredient. `None` rejects the row.
pub fn parse_row(cells: &[Cell]) -> Option<ParsedIngredient> {
    let raw_line = row_text(cells);

    let (name_text, amount, unit, dv_percent, used): (String, _, _, _, Vec<&Cell>) =
        match cells {
            [] => return None,
            [only] => match split_trailing_amount(&only.text) {
                Some((name, amount, unit)) => (name, Some(amount), Some(unit), None, vec![only]),
                None => (only.text.clone(), None, None, None, vec![only]),
            },
            [name, value] => {
                if value.text.contains('%') {
                    (name.text.clone(), None, None, parse_dv_percent(&value.text), vec![name, value])
                } else {
                    let (amount, unit) = parse_amount_and_unit(&value.text);
                    (name.text.clone(), amount, unit, None, vec![name, value])
                }
            }
            [name, value, dv, ..] => {
                let (amount, unit) = parse_amount_and_unit(&value.text);
                (
                    name.text.clone(),
                    amount,
                    unit,
                    parse_dv_percent(&dv.text),
                    vec![name, value, dv],
                )
            }
        };

    let Some(name) = clean_name(&name_text) else {
        tracing::debug!(line = %raw_line, "Row rejected: name too short");
        return None;
    };

    Some(ParsedIngredient {
        name,
        amount,
        unit,
        dv_percent,
        confidence: mean_confidence(&used).clamp(0.0, 1.0),
        raw_line,
    })
}

/// Result of parsing every row of one label
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    pub serving_size: Option<String>,
    pub ingredients: Vec<ParsedIngredient>,
    pub rows_attempted: usize,
    pub issues: Vec<ValidationIssue>,
}

/// Parse all rows of a label
pub fn parse_rows(rows: &[Vec<Cell>]) -> ParsedRows {
    let serving_size = detect_serving_size(rows);
    let header = detect_header(rows);

    let mut issues = Vec::new();
    if header.is_none() {
        issues.push(ValidationIssue::new(
            IssueKind::HeaderNotFound,
            "No ingredient table header found; rows after the first were attempted",
        ));
    }

    // Without a header, row 0 is treated as the title line
    let start = header.map_or(1, |h| h + 1);
    let mut ingredients = Vec::new();
    let mut rows_attempted = 0;

    for cells in rows.iter().skip(start) {
        let text = row_text(cells);
        if text.trim().is_empty() || is_serving_line(&text) || is_non_ingredient_row(&text) {
            tracing::debug!(line = %text, "Skipping non-ingredient row");
            continue;
        }

        rows_attempted += 1;
        if let Some(ingredient) = parse_row(cells) {
            ingredients.push(ingredient);
        }
    }

    tracing::debug!(
        header = ?header,
        rows_attempted,
        ingredients = ingredients.len(),
        "Parsed label rows"
    );

    ParsedRows {
        serving_size,
        ingredients,
        rows_attempted,
        issues,
    }
}
