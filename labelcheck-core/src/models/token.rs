//! OCR geometry types: tokens from the vision service, and the rows and
//! cells the clusterer builds from them

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

/// One recognized word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub bbox: BoundingBox,
    /// Per-word recognition confidence in [0, 1]
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl Token {
    pub fn new(text: impl Into<String>, bbox: BoundingBox, confidence: f64) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn height(&self) -> f64 {
        (self.bbox.y_max - self.bbox.y_min).max(0.0)
    }

    pub fn center_y(&self) -> f64 {
        (self.bbox.y_min + self.bbox.y_max) / 2.0
    }
}

/// Tokens judged to lie on one visual line.
///
/// Tokens are always x-sorted; the vertical extent is derived at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    tokens: Vec<Token>,
    center_y: f64,
    y_min: f64,
    y_max: f64,
}

impl Row {
    /// Build a row, sorting tokens left to right. Returns `None` for an empty list.
    pub fn new(mut tokens: Vec<Token>) -> Option<Self> {
        if tokens.is_empty() {
            return None;
        }
        tokens.sort_by(|a, b| a.bbox.x_min.total_cmp(&b.bbox.x_min));

        let y_min = tokens.iter().map(|t| t.bbox.y_min).fold(f64::INFINITY, f64::min);
        let y_max = tokens.iter().map(|t| t.bbox.y_max).fold(f64::NEG_INFINITY, f64::max);
        let center_y = tokens.iter().map(Token::center_y).sum::<f64>() / tokens.len() as f64;

        Some(Self {
            tokens,
            center_y,
            y_min,
            y_max,
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn center_y(&self) -> f64 {
        self.center_y
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Space-joined token text
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Contiguous run of tokens within a row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub text: String,
    pub x_min: f64,
    pub x_max: f64,
    /// Mean confidence of the member tokens
    pub confidence: f64,
    pub token_count: usize,
}

impl Cell {
    /// Build a cell from x-sorted tokens. Returns `None` for an empty slice.
    pub fn from_tokens(tokens: &[Token]) -> Option<Self> {
        let first = tokens.first()?;
        let last = tokens.last()?;
        let text = tokens
            .iter()
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let confidence = tokens.iter().map(|t| t.confidence).sum::<f64>() / tokens.len() as f64;

        Some(Self {
            text,
            x_min: first.bbox.x_min,
            x_max: last.bbox.x_max,
            confidence,
            token_count: tokens.len(),
        })
    }
}
