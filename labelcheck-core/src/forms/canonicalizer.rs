//! Form Token Canonicalizer
//!
//! Rewrites free-text ingredient form descriptions ("Rhizome extract",
//! "Coenzyme Q10", "pyridoxine hydrochloride") into an ordered,
//! deduplicated list of canonical tokens.
//!
//! **Stages:**
//! 1. CoQ10 aliases collapse to `ubiquinone`
//! 2. Per-word rewrite table; invalid tokens dropped
//! 3. Cleanup: filler words and dosage tokens dropped

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NON_TOKEN_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]+").unwrap());

static DOSAGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(mg|mcg|g|iu|ml|cfu)$").unwrap());

const COQ10_ALIASES: &[&str] = &[
    "coenzyme q10",
    "coenzymeq10",
    "coq10",
    "ubidecarenone",
    "ubiquinone",
    "q10",
];

const COQ10_TOKEN: &str = "ubiquinone";

// "dhe" is an OCR artifact seen in dataset form strings; kept for parity,
// pending taxonomy review.
const FILLER_TOKENS: &[&str] = &["and", "dhe"];

/// Word rewrites, evaluated in order. Every output must be a fixed point of
/// the table so canonicalization stays idempotent.
const REWRITE_RULES: &[(&str, &[&str])] = &[
    ("rhizome", &["root"]),
    ("rhizomes", &["root"]),
    ("roots", &["root"]),
    ("radix", &["root"]),
    ("aerial_parts", &["whole", "plant"]),
    ("herb", &["whole", "plant"]),
    ("leaves", &["leaf"]),
    ("leafs", &["leaf"]),
    ("folium", &["leaf"]),
    ("seeds", &["seed"]),
    ("fruits", &["fruit"]),
    ("berries", &["berry"]),
    ("flowers", &["flower"]),
    ("barks", &["bark"]),
    ("hydrochloride", &["hcl"]),
    ("monohydrate", &["hydrate"]),
    ("dihydrate", &["hydrate"]),
    ("chelated", &["chelate"]),
    ("sulphate", &["sulfate"]),
    ("methylfolate", &["5_mthf"]),
    ("l_methylfolate", &["5_mthf"]),
    ("5mthf", &["5_mthf"]),
    ("tocopherols", &["tocopherol"]),
    ("extracts", &["extract"]),
];

/// Lowercase, collapse every non `[a-z0-9_]` run to one space, trim
pub fn normalize_form_text(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    NON_TOKEN_CHARS.replace_all(&lowered, " ").trim().to_string()
}

/// A canonical token is longer than one character and not purely numeric
pub fn is_valid_token(token: &str) -> bool {
    token.chars().count() > 1 && !token.chars().all(|c| c.is_ascii_digit())
}

fn is_coq10(normalized: &str) -> bool {
    COQ10_ALIASES
        .iter()
        .any(|alias| normalized == *alias || normalized.contains(alias))
}

fn rewrite_word(word: &str) -> Vec<&str> {
    REWRITE_RULES
        .iter()
        .find(|(from, _)| *from == word)
        .map(|(_, to)| to.to_vec())
        .unwrap_or_else(|| vec![word])
}

/// Ordered set of tokens with first-seen order preserved
#[derive(Default)]
struct TokenSet {
    seen: HashSet<String>,
    tokens: Vec<String>,
}

impl TokenSet {
    fn push(&mut self, token: &str) {
        if is_valid_token(token) && self.seen.insert(token.to_string()) {
            self.tokens.push(token.to_string());
        }
    }
}

fn cleanup(tokens: Vec<String>) -> Vec<String> {
    let mut set = TokenSet::default();
    for token in tokens {
        if FILLER_TOKENS.contains(&token.as_str()) || DOSAGE_TOKEN.is_match(&token) {
            continue;
        }
        set.push(&token);
    }
    set.tokens
}

/// Canonicalize one or more form/name strings into a deduplicated token list
pub fn canonicalize_form_tokens<S: AsRef<str>>(inputs: &[S]) -> Vec<String> {
    let mut set = TokenSet::default();

    for input in inputs {
        let normalized = normalize_form_text(input.as_ref());
        if normalized.is_empty() {
            continue;
        }

        if is_coq10(&normalized) {
            set.push(COQ10_TOKEN);
            continue;
        }

        for word in normalized.split_whitespace() {
            for token in rewrite_word(word) {
                set.push(token);
            }
        }
    }

    cleanup(set.tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_form_text() {
        assert_eq!(normalize_form_text("  Magnesium (as Citrate)!  "), "magnesium as citrate");
        assert_eq!(normalize_form_text("5_MTHF"), "5_mthf");
        assert_eq!(normalize_form_text("---"), "");
    }

    #[test]
    fn test_coq10_aliases_collapse() {
        for input in ["Coenzyme Q10", "CoQ10", "Ubidecarenone", "coenzyme-q10 (softgel)"] {
            assert_eq!(canonicalize_form_tokens(&[input]), vec!["ubiquinone"], "{}", input);
        }
    }

    #[test]
    fn test_rewrite_table() {
        assert_eq!(canonicalize_form_tokens(&["Rhizome Extract"]), vec!["root", "extract"]);
        assert_eq!(canonicalize_form_tokens(&["aerial_parts"]), vec!["whole", "plant"]);
        assert_eq!(
            canonicalize_form_tokens(&["Pyridoxine Hydrochloride"]),
            vec!["pyridoxine", "hcl"]
        );
    }

    #[test]
    fn test_invalid_tokens_dropped() {
        assert_eq!(canonicalize_form_tokens(&["Vitamin B 12 a"]), vec!["vitamin"]);
    }

    #[test]
    fn test_cleanup_drops_filler_and_dosage() {
        assert_eq!(
            canonicalize_form_tokens(&["Leaves and Roots 500mg dhe 10cfu"]),
            vec!["leaf", "root"]
        );
    }

    #[test]
    fn test_multiple_inputs_deduplicated_in_order() {
        assert_eq!(
            canonicalize_form_tokens(&["citrate malate", "Malate, glycinate"]),
            vec!["citrate", "malate", "glycinate"]
        );
    }

    #[test]
    fn test_canonicalization_idempotent() {
        let inputs = [
            "Ginger Rhizome Extract",
            "Coenzyme Q10",
            "zinc bisglycinate chelated",
            "aerial_parts",
            "L-Methylfolate calcium",
        ];
        for input in inputs {
            let once = canonicalize_form_tokens(&[input]);
            let twice = canonicalize_form_tokens(&once);
            assert_eq!(once, twice, "{}", input);
        }
    }

    #[test]
    fn test_rewrite_outputs_are_fixed_points() {
        for (_, outputs) in REWRITE_RULES {
            for output in *outputs {
                assert_eq!(rewrite_word(output), vec![*output]);
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(canonicalize_form_tokens(&["", "  ", "()"]).is_empty());
        assert!(canonicalize_form_tokens::<&str>(&[]).is_empty());
    }
}
