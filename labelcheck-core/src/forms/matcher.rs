//! Form/Alias Matcher
//!
//! Decides whether a declared form matches one of the ingredient's verified
//! taxonomy forms, falling back to the alias table. Matching runs on
//! normalized text (lowercase, non-alphanumerics collapsed to spaces), so
//! case and punctuation never change the outcome.
//!
//! **Form checks, strongest first:**
//! 1. Candidate text contains the normalized form key
//! 2. Every key token is a candidate token
//! 3. Every label token is a candidate token
//! 4. Any label token is a candidate token

use super::canonicalizer::canonicalize_form_tokens;
use super::explicit::collect_explicit_form_tokens;
use crate::models::{FormAlias, IngredientForm};
use serde::Serialize;
use std::collections::HashSet;

/// Which reference table produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Form,
    Alias,
}

/// Result of matching one declared form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FormMatchOutcome {
    Matched { form_key: String, via: MatchSource },
    NoMatch,
    /// The ingredient has no verified forms to match against
    MissingVerifiedForms,
}

impl FormMatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, FormMatchOutcome::Matched { .. })
    }
}

/// Lowercase, collapse every non-alphanumeric run to one space, trim
pub fn normalize_match_text(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized candidate text and its token set
#[derive(Debug, Clone)]
pub struct Candidate {
    text: String,
    tokens: HashSet<String>,
}

impl Candidate {
    /// Candidate from text as given
    pub fn new(raw: &str) -> Self {
        let text = normalize_match_text(raw);
        let tokens = text.split_whitespace().map(str::to_string).collect();
        Self { text, tokens }
    }

    /// Candidate enriched with canonical and explicit chemical-form tokens
    pub fn from_raw_form(raw: &str) -> Self {
        let mut parts = vec![raw.to_string()];
        parts.extend(canonicalize_form_tokens(&[raw]));
        parts.extend(collect_explicit_form_tokens(&[raw]));
        Self::new(&parts.join(" "))
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn contains_all(&self, normalized: &str) -> bool {
        let mut words = normalized.split_whitespace().peekable();
        words.peek().is_some() && words.all(|w| self.tokens.contains(w))
    }

    fn contains_any(&self, normalized: &str) -> bool {
        normalized.split_whitespace().any(|w| self.tokens.contains(w))
    }

    fn contains_phrase(&self, normalized: &str) -> bool {
        !normalized.is_empty() && self.text.contains(normalized)
    }
}

/// True when the candidate matches the verified form
pub fn form_matches(candidate: &Candidate, form: &IngredientForm) -> bool {
    if candidate.is_empty() {
        return false;
    }
    let key = normalize_match_text(&form.form_key);
    let label = normalize_match_text(&form.form_label);

    candidate.contains_phrase(&key)
        || candidate.contains_all(&key)
        || candidate.contains_all(&label)
        || candidate.contains_any(&label)
}

/// True when the candidate matches the alias
pub fn alias_matches(candidate: &Candidate, alias: &FormAlias) -> bool {
    if candidate.is_empty() {
        return false;
    }
    let source = alias
        .alias_norm
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(&alias.alias_text);
    let norm = normalize_match_text(source);
    if norm.is_empty() {
        return false;
    }

    candidate.text == norm
        || candidate.contains_phrase(&norm)
        || candidate.contains_all(&norm)
        || candidate.contains_any(&norm)
}

/// Match a declared form against an ingredient's reference data.
///
/// `forms` may include unverified rows; only verified ones are considered.
/// With no verified forms the outcome is [`FormMatchOutcome::MissingVerifiedForms`],
/// never a silent pass.
pub fn match_form(
    raw_form: &str,
    ingredient_id: i64,
    forms: &[IngredientForm],
    aliases: &[FormAlias],
) -> FormMatchOutcome {
    let verified: Vec<&IngredientForm> = forms
        .iter()
        .filter(|f| f.is_verified() && f.ingredient_id == ingredient_id)
        .collect();
    if verified.is_empty() {
        return FormMatchOutcome::MissingVerifiedForms;
    }

    let candidate = Candidate::from_raw_form(raw_form);
    if candidate.is_empty() {
        return FormMatchOutcome::NoMatch;
    }

    if let Some(form) = verified.iter().find(|f| form_matches(&candidate, f)) {
        return FormMatchOutcome::Matched {
            form_key: form.form_key.clone(),
            via: MatchSource::Form,
        };
    }

    // Alias keys only count when they point at a verified form
    let verified_keys: HashSet<&str> = verified.iter().map(|f| f.form_key.as_str()).collect();
    let alias = aliases.iter().find(|a| {
        a.applies_to(ingredient_id)
            && verified_keys.contains(a.form_key.as_str())
            && alias_matches(&candidate, a)
    });
    match alias {
        Some(alias) => FormMatchOutcome::Matched {
            form_key: alias.form_key.clone(),
            via: MatchSource::Alias,
        },
        None => FormMatchOutcome::NoMatch,
    }
}
