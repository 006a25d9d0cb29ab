//! Ingredient form handling: canonical tokens, explicit chemical forms,
//! matching against the verified taxonomy, and form coverage evidence

pub mod canonicalizer;
pub mod coverage;
pub mod explicit;
pub mod matcher;

pub use canonicalizer::{canonicalize_form_tokens, normalize_form_text};
pub use coverage::{check_unit, evaluate_form_coverage, CoverageDetail, CoverageStatus, FormCoverage, UnitCheck};
pub use explicit::{collect_explicit_form_tokens, extract_explicit_form_tokens};
pub use matcher::{match_form, normalize_match_text, Candidate, FormMatchOutcome, MatchSource};
