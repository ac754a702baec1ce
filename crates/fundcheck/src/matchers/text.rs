use crate::schema::normalize_text;

use super::clamp_score;

/// Normalized edit-distance similarity: `1 - distance / max(len_a, len_b)`.
pub fn fuzzy_score(application: &str, extracted: &str) -> f64 {
    let a = normalize_text(application);
    let b = normalize_text(extracted);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(&a, &b);
    clamp_score(1.0 - distance as f64 / longest as f64)
}

/// Equipment-category synonyms accepted as exact matches. Keys and synonyms
/// are compared post-normalization.
const CATEGORY_SYNONYMS: &[(&str, &[&str])] = &[
    ("tractor", &["agricultural tractor", "farm tractor", "compact tractor"]),
    ("excavator", &["digger", "mini excavator", "mini digger"]),
    ("generator", &["genset", "diesel generator", "power generator"]),
    ("polytunnel", &["poly tunnel", "hoop house", "greenhouse tunnel"]),
    ("cold store", &["cold room", "walk-in chiller", "refrigerated store"]),
    ("milking machine", &["milking parlour", "milking system"]),
];

/// Compare a freeform description against an expected category.
///
/// Exact or synonym match scores 1.0; otherwise the score falls back to the
/// fuzzy similarity so partially descriptive text lands in between, and
/// unrelated text decays to 0.
pub fn categorical_score(expected_category: &str, description: &str) -> f64 {
    let expected = normalize_text(expected_category);
    let observed = normalize_text(description);

    if expected == observed {
        return 1.0;
    }

    for (category, synonyms) in CATEGORY_SYNONYMS {
        let in_group = |value: &str| *category == value || synonyms.contains(&value);
        if in_group(&expected) && in_group(&observed) {
            return 1.0;
        }
    }

    // A description that merely contains the category still counts as exact,
    // e.g. "a red compact tractor" for "tractor".
    if !expected.is_empty() && observed.contains(&expected) {
        return 1.0;
    }

    fuzzy_score(&expected, &observed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(fuzzy_score("Hilltop Farm", "hilltop  farm"), 1.0);
    }

    #[test]
    fn disjoint_strings_score_near_zero() {
        let score = fuzzy_score("abcdef", "uvwxyz");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn close_variants_score_above_threshold() {
        let score = fuzzy_score("AgriTech Ltd", "Agritech Ltd.");
        assert!(score >= 0.8, "score was {score}");
    }

    #[test]
    fn scores_stay_in_bounds() {
        for (a, b) in [("", ""), ("a", ""), ("", "b"), ("short", "a much longer string")] {
            let score = fuzzy_score(a, b);
            assert!((0.0..=1.0).contains(&score), "{a:?} vs {b:?} -> {score}");
        }
    }

    #[test]
    fn synonyms_match_exactly() {
        assert_eq!(categorical_score("tractor", "Farm Tractor"), 1.0);
        assert_eq!(categorical_score("excavator", "digger"), 1.0);
    }

    #[test]
    fn descriptions_containing_the_category_match() {
        assert_eq!(categorical_score("tractor", "a red compact tractor"), 1.0);
    }

    #[test]
    fn unrelated_description_scores_low() {
        let score = categorical_score("tractor", "office printer");
        assert!(score < 0.5, "score was {score}");
    }
}
