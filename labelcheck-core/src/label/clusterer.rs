//! Token Geometry Clusterer
//!
//! Groups flat OCR tokens into rows, then splits each row into cells.
//! Both thresholds adapt to the token size statistics of the input, so the
//! same code handles close-up and wide-angle photos.
//!
//! **Row merge threshold:** 0.6 × median token height
//! **Cell gap threshold:** max(2 × median gap, 1.2 × median height)

use crate::models::{Cell, Row, Token};

const ROW_MERGE_FACTOR: f64 = 0.6;
const GAP_FACTOR: f64 = 2.0;
const HEIGHT_GAP_FACTOR: f64 = 1.2;

/// Median of a list of values (0.0 when empty)
pub(crate) fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn median_height(tokens: &[Token]) -> f64 {
    let mut heights: Vec<f64> = tokens.iter().map(Token::height).collect();
    median(&mut heights)
}

/// Cluster tokens into rows ordered top to bottom.
///
/// Tokens are walked in vertical-center order; a token joins the current row
/// while its center lies within the threshold of the row's running mean
/// center. Empty input yields no rows.
pub fn cluster_rows(tokens: &[Token]) -> Vec<Row> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let threshold = ROW_MERGE_FACTOR * median_height(tokens);

    let mut sorted: Vec<&Token> = tokens.iter().collect();
    sorted.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

    let mut rows = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut center_sum = 0.0;

    for token in sorted {
        if !current.is_empty() {
            let running_center = center_sum / current.len() as f64;
            if (token.center_y() - running_center).abs() > threshold {
                rows.extend(Row::new(std::mem::take(&mut current)));
                center_sum = 0.0;
            }
        }
        center_sum += token.center_y();
        current.push(token.clone());
    }
    rows.extend(Row::new(current));

    tracing::debug!(
        tokens = tokens.len(),
        rows = rows.len(),
        threshold,
        "Clustered tokens into rows"
    );

    rows
}

/// Horizontal gap threshold used to split a row into cells
pub fn gap_threshold(row: &Row) -> f64 {
    let tokens = row.tokens();
    let mut gaps: Vec<f64> = tokens
        .windows(2)
        .map(|pair| (pair[1].bbox.x_min - pair[0].bbox.x_max).max(0.0))
        .collect();
    let median_gap = median(&mut gaps);

    (GAP_FACTOR * median_gap).max(HEIGHT_GAP_FACTOR * median_height(tokens))
}

/// Split a row into cells wherever the gap to the previous token exceeds
/// [`gap_threshold`]. Never yields an empty cell.
pub fn infer_table_columns(row: &Row) -> Vec<Cell> {
    let tokens = row.tokens();
    let threshold = gap_threshold(row);

    let mut cells = Vec::new();
    let mut start = 0;
    for i in 1..tokens.len() {
        let gap = tokens[i].bbox.x_min - tokens[i - 1].bbox.x_max;
        if gap > threshold {
            cells.extend(Cell::from_tokens(&tokens[start..i]));
            start = i;
        }
    }
    cells.extend(Cell::from_tokens(&tokens[start..]));

    cells
}
