//! Explicit chemical-form extraction
//!
//! The per-word rewrite table cannot recover multi-word chemical names that
//! punctuation splits apart ("pyridoxal-5'-phosphate", "L-5-MTHF"). These
//! rules match whole phrases on the raw text and emit fixed tokens.
//!
//! Rules run in order. Rules sharing an exclusion group are mutually
//! exclusive: once one fires, later rules of that group are skipped
//! (`bisglycinate` suppresses `glycinate`, `p5p` suppresses `phosphate`).

use super::canonicalizer::canonicalize_form_tokens;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// One phrase rule
pub struct ExplicitFormRule {
    pub pattern: Regex,
    pub tokens: &'static [&'static str],
    pub group: Option<&'static str>,
}

fn rule(
    pattern: &str,
    tokens: &'static [&'static str],
    group: Option<&'static str>,
) -> ExplicitFormRule {
    ExplicitFormRule {
        pattern: Regex::new(pattern).unwrap(),
        tokens,
        group,
    }
}

static EXPLICIT_FORM_RULES: Lazy<Vec<ExplicitFormRule>> = Lazy::new(|| {
    vec![
        rule(r"\bsodium\s+ascorbate\b", &["sodium_ascorbate"], None),
        rule(r"\bcalcium\s+ascorbate\b", &["calcium_ascorbate"], None),
        rule(r"\bascorbyl\s+palmitate\b", &["ascorbyl_palmitate"], None),
        rule(r"\bascorbic\s+acid\b", &["ascorbic_acid"], None),
        rule(
            r"\b(?:l\s*-?\s*)?5\s*-?\s*mthf\b|\b(?:l\s*-?\s*|6\s*\(?s\)?\s*-?\s*)?methyl\s*-?\s*folate\b|\b5\s*-?\s*methyl\s*-?\s*tetrahydrofolate\b",
            &["5_mthf"],
            None,
        ),
        rule(r"\bfolic\s+acid\b", &["folic_acid"], None),
        rule(
            r"\bpyridoxal\s*-?\s*5?\s*'?\s*-?\s*phosphate\b|\bp\s*-?\s*5\s*-?\s*p\b|\bplp\b",
            &["p5p"],
            Some("phosphate"),
        ),
        rule(r"\bpyridoxine\s+(?:hcl|hydrochloride)\b", &["pyridoxine_hcl"], None),
        rule(r"\bmethylcobalamin\b", &["methylcobalamin"], None),
        rule(r"\bcyanocobalamin\b", &["cyanocobalamin"], None),
        rule(r"\badenosylcobalamin\b", &["adenosylcobalamin"], None),
        rule(r"\bubiquinol\b", &["ubiquinol"], None),
        rule(
            r"\bubiquinone\b|\bco\s*-?\s*enzyme\s*-?\s*q\s*-?\s*10\b|\bcoq\s*-?\s*10\b",
            &["ubiquinone"],
            None,
        ),
        rule(r"\bcholecalciferol\b|\bvitamin\s+d\s*-?\s*3\b", &["cholecalciferol"], None),
        rule(r"\bergocalciferol\b|\bvitamin\s+d\s*-?\s*2\b", &["ergocalciferol"], None),
        rule(r"\bbis\s*-?\s*glycinate\b|\bdiglycinate\b", &["bisglycinate", "chelate"], Some("glycinate")),
        rule(r"\bglycinate\b", &["glycinate"], Some("glycinate")),
        rule(r"\bpicolinate\b", &["picolinate"], None),
        rule(r"\bcitrate\b", &["citrate"], None),
        rule(r"\bmalate\b", &["malate"], None),
        rule(r"\bgluconate\b", &["gluconate"], None),
        rule(r"\bsulfate\b|\bsulphate\b", &["sulfate"], None),
        rule(r"\bcarbonate\b", &["carbonate"], None),
        rule(r"\bchloride\b", &["chloride"], None),
        rule(r"\boxide\b", &["oxide"], None),
        rule(r"\bphosphate\b", &["phosphate"], Some("phosphate")),
        rule(r"\btaurate\b", &["taurate"], None),
        rule(r"\bchelated?\b", &["chelate"], None),
        rule(r"\bacetate\b", &["acetate"], None),
        rule(r"\bsuccinate\b", &["succinate"], None),
    ]
});

/// Ordered rule list, exposed for inspection
pub fn explicit_form_rules() -> &'static [ExplicitFormRule] {
    &EXPLICIT_FORM_RULES
}

/// Tokens of every rule matching the text, in rule order, without repeats
pub fn extract_explicit_form_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut fired_groups: HashSet<&str> = HashSet::new();
    let mut tokens: Vec<String> = Vec::new();

    for rule in explicit_form_rules() {
        if let Some(group) = rule.group {
            if fired_groups.contains(group) {
                continue;
            }
        }
        if rule.pattern.is_match(&lowered) {
            if let Some(group) = rule.group {
                fired_groups.insert(group);
            }
            for token in rule.tokens {
                if !tokens.iter().any(|t| t == token) {
                    tokens.push(token.to_string());
                }
            }
        }
    }

    tokens
}

/// Run extraction over several sources and canonicalize the union
pub fn collect_explicit_form_tokens<S: AsRef<str>>(sources: &[S]) -> Vec<String> {
    let hits: Vec<String> = sources
        .iter()
        .flat_map(|s| extract_explicit_form_tokens(s.as_ref()))
        .collect();
    canonicalize_form_tokens(&hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_forms() {
        assert_eq!(extract_explicit_form_tokens("Magnesium Citrate"), vec!["citrate"]);
        assert_eq!(
            extract_explicit_form_tokens("zinc (as zinc sulphate, zinc oxide)"),
            vec!["sulfate", "oxide"]
        );
    }

    #[test]
    fn test_bisglycinate_suppresses_glycinate() {
        assert_eq!(
            extract_explicit_form_tokens("Iron Bisglycinate Chelate"),
            vec!["bisglycinate", "chelate"]
        );
        assert_eq!(extract_explicit_form_tokens("bis-glycinate"), vec!["bisglycinate", "chelate"]);
        assert_eq!(extract_explicit_form_tokens("Magnesium Glycinate"), vec!["glycinate"]);
    }

    #[test]
    fn test_methylfolate_variants() {
        for text in [
            "5-MTHF",
            "L-5-MTHF",
            "L-Methylfolate",
            "(6S)-5-methyltetrahydrofolate",
            "Folate (as methyl folate)",
        ] {
            assert_eq!(extract_explicit_form_tokens(text), vec!["5_mthf"], "{}", text);
        }
        assert_eq!(extract_explicit_form_tokens("Folic Acid"), vec!["folic_acid"]);
    }

    #[test]
    fn test_pyridoxal_phosphate_is_not_a_phosphate_salt() {
        assert_eq!(extract_explicit_form_tokens("Pyridoxal-5'-Phosphate"), vec!["p5p"]);
        assert_eq!(extract_explicit_form_tokens("Vitamin B6 (as P5P)"), vec!["p5p"]);
        assert_eq!(extract_explicit_form_tokens("Dicalcium Phosphate"), vec!["phosphate"]);
    }

    #[test]
    fn test_ascorbates() {
        assert_eq!(extract_explicit_form_tokens("Sodium Ascorbate"), vec!["sodium_ascorbate"]);
        assert_eq!(extract_explicit_form_tokens("ascorbic acid"), vec!["ascorbic_acid"]);
    }

    #[test]
    fn test_ubiquinol_vs_ubiquinone() {
        assert_eq!(extract_explicit_form_tokens("Kaneka Ubiquinol"), vec!["ubiquinol"]);
        assert_eq!(extract_explicit_form_tokens("CoQ-10"), vec!["ubiquinone"]);
    }

    #[test]
    fn test_no_match_on_noise() {
        assert!(extract_explicit_form_tokens("proprietary blend 500 mg").is_empty());
        assert!(extract_explicit_form_tokens("").is_empty());
    }

    #[test]
    fn test_collect_canonicalizes_union() {
        let tokens = collect_explicit_form_tokens(&[
            "Iron (as ferrous bisglycinate chelate)",
            "Vitamin C (as sodium ascorbate)",
            "CoQ10 50mg",
        ]);

        assert_eq!(
            tokens,
            vec!["bisglycinate", "chelate", "sodium_ascorbate", "ubiquinone"]
        );
    }

    #[test]
    fn test_rule_tokens_are_canonical() {
        for rule in explicit_form_rules() {
            let tokens: Vec<String> = rule.tokens.iter().map(|t| t.to_string()).collect();
            assert_eq!(canonicalize_form_tokens(&tokens), tokens);
        }
    }
}
