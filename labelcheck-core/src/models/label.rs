//! Label extraction results

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// One accepted ingredient line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIngredient {
    /// Trimmed name with footnote markers stripped
    pub name: String,
    pub amount: Option<f64>,
    /// Normalized unit (`mg`, `mcg`, `IU`, ...)
    pub unit: Option<String>,
    pub dv_percent: Option<u32>,
    /// Mean confidence of the contributing cells
    pub confidence: f64,
    /// Source line, kept for audit
    pub raw_line: String,
}

impl ParsedIngredient {
    /// True when both amount and unit were recovered
    pub fn has_amount_and_unit(&self) -> bool {
        self.amount.is_some() && self.unit.is_some()
    }
}

/// Kind of validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UnitInvalid,
    ValueAnomaly,
    MissingServingSize,
    HeaderNotFound,
    LowCoverage,
    /// Kind written by a newer producer; scored with the default weight
    #[serde(other)]
    Unknown,
}

impl IssueKind {
    /// Confidence penalty for one occurrence
    pub fn severity_weight(&self) -> f64 {
        match self {
            IssueKind::MissingServingSize => 0.15,
            IssueKind::HeaderNotFound => 0.10,
            IssueKind::LowCoverage => 0.20,
            IssueKind::UnitInvalid => 0.10,
            IssueKind::ValueAnomaly => 0.15,
            IssueKind::Unknown => 0.05,
        }
    }

    /// Kinds that force manual confirmation on their own
    pub fn forces_confirmation(&self) -> bool {
        matches!(
            self,
            IssueKind::MissingServingSize | IssueKind::UnitInvalid | IssueKind::ValueAnomaly
        )
    }
}

/// Diagnostic finding with a human-readable message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Aggregate result of structuring one label.
///
/// Parse coverage is never stored: it is recomputed from the ingredient list
/// and the number of rows that reached a parse attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDraft {
    pub serving_size: Option<String>,
    pub ingredients: Vec<ParsedIngredient>,
    /// Ingredient-like rows that reached the parse attempt
    pub rows_attempted: usize,
    pub confidence_score: f64,
    pub issues: Vec<ValidationIssue>,
}

impl LabelDraft {
    /// Parsed-with-amount-and-unit ÷ rows attempted (0 when nothing was attempted)
    pub fn parse_coverage(&self) -> f64 {
        if self.rows_attempted == 0 {
            return 0.0;
        }
        let parsed = self
            .ingredients
            .iter()
            .filter(|i| i.has_amount_and_unit())
            .count();
        (parsed as f64 / self.rows_attempted as f64).clamp(0.0, 1.0)
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    /// True when a person should confirm the extraction before it is used
    pub fn needs_confirmation(&self) -> bool {
        crate::label::validator::needs_confirmation(
            self.confidence_score,
            self.parse_coverage(),
            &self.issues,
        )
    }
}

impl Serialize for LabelDraft {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LabelDraft", 6)?;
        state.serialize_field("servingSize", &self.serving_size)?;
        state.serialize_field("ingredients", &self.ingredients)?;
        state.serialize_field("parseCoverage", &self.parse_coverage())?;
        state.serialize_field("confidenceScore", &self.confidence_score)?;
        state.serialize_field("issues", &self.issues)?;
        state.serialize_field("needsConfirmation", &self.needs_confirmation())?;
        state.end()
    }
}
