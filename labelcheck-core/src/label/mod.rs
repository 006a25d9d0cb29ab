//! Label structuring pipeline
//!
//! OCR tokens → rows → cells → ingredients → validated [`LabelDraft`].
//! Every stage is a pure function of its input; malformed input lowers
//! coverage and confidence instead of failing.

pub mod amount;
pub mod clusterer;
pub mod row_parser;
pub mod validator;

pub use amount::{parse_amount_and_unit, parse_dv_percent};
pub use clusterer::{cluster_rows, infer_table_columns};
pub use validator::needs_confirmation;

use crate::models::{Cell, LabelDraft, Token};
use tracing::info;

/// Structure a label from its OCR tokens
pub fn structure_label(tokens: &[Token]) -> LabelDraft {
    let rows = cluster_rows(tokens);
    let cells: Vec<Vec<Cell>> = rows.iter().map(infer_table_columns).collect();
    structure_label_from_cells(&cells)
}

/// Structure a label whose rows were already split into cells
pub fn structure_label_from_cells(rows: &[Vec<Cell>]) -> LabelDraft {
    let parsed = row_parser::parse_rows(rows);

    let mut draft = LabelDraft {
        serving_size: parsed.serving_size,
        ingredients: parsed.ingredients,
        rows_attempted: parsed.rows_attempted,
        confidence_score: 0.0,
        issues: parsed.issues,
    };

    let coverage = draft.parse_coverage();
    validator::validate(
        &draft.ingredients,
        coverage,
        draft.serving_size.as_deref(),
        &mut draft.issues,
    );
    draft.confidence_score =
        validator::compute_confidence(coverage, &draft.issues, &draft.ingredients);

    info!(
        rows = rows.len(),
        ingredients = draft.ingredients.len(),
        coverage,
        confidence = draft.confidence_score,
        issues = draft.issues.len(),
        needs_confirmation = draft.needs_confirmation(),
        "Structured label"
    );

    draft
}
