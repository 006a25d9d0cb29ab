//! OCR token fixtures laid out like a photographed label

use labelcheck_core::models::{BoundingBox, Token};

const WORD_HEIGHT: f64 = 20.0;
const LINE_PITCH: f64 = 40.0;
const CHAR_WIDTH: f64 = 10.0;
const WORD_GAP: f64 = 8.0;

/// Tokens for one label line. Each cell starts at its given x; words inside
/// a cell are separated by a small gap.
pub fn label_row(line: usize, cells: &[(f64, &str)]) -> Vec<Token> {
    let y_min = 100.0 + line as f64 * LINE_PITCH;
    let mut tokens = Vec::new();

    for (x_start, text) in cells {
        let mut x = *x_start;
        for word in text.split_whitespace() {
            let width = word.chars().count() as f64 * CHAR_WIDTH;
            tokens.push(Token::new(
                word,
                BoundingBox::new(x, x + width, y_min, y_min + WORD_HEIGHT),
                0.95,
            ));
            x += width + WORD_GAP;
        }
    }
    tokens
}

/// Accumulates label lines top to bottom
#[derive(Default)]
pub struct LabelBuilder {
    tokens: Vec<Token>,
    line: usize,
}

impl LabelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, cells: &[(f64, &str)]) -> Self {
        self.tokens.extend(label_row(self.line, cells));
        self.line += 1;
        self
    }

    /// Three-column ingredient line: name, amount, %DV
    pub fn ingredient(self, name: &str, amount: &str, dv: &str) -> Self {
        self.line(&[(20.0, name), (520.0, amount), (720.0, dv)])
    }

    pub fn build(self) -> Vec<Token> {
        self.tokens
    }
}
