//! Data model shared by the label pipeline, form matching, UL warnings and
//! diagnostics

pub mod label;
pub mod product;
pub mod reference;
pub mod token;

pub use label::{IssueKind, LabelDraft, ParsedIngredient, ValidationIssue};
pub use product::{ProductIngredient, ScoredProduct};
pub use reference::{AuditStatus, FormAlias, IngredientForm, IngredientMeta, ReferenceData};
pub use token::{BoundingBox, Cell, Row, Token};
