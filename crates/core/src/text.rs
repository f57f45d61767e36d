//! Tokenization and overlap-scoring primitives.
//!
//! Everything in this module is a pure function over already-extracted
//! strings or pre-built token sets; the fuzzy matcher and the study
//! ranker both build on these so the scoring rules can be tested
//! without any document I/O.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// Common words ignored when picking key terms for fuzzy matching.
pub const COMMON_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "has", "have", "had", "this", "that", "these",
    "those", "what", "which", "who", "when", "where", "how", "and", "or", "but", "if", "of", "to",
    "for", "with", "from", "by", "in", "on", "at",
];

/// Lowercase, collapse whitespace, unify dash variants, and drop
/// sentence punctuation so that cosmetically different renderings of
/// the same stem compare equal. Hyphens, digits, and currency symbols
/// survive; they carry matching signal.
pub fn normalize_for_match(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let unified = lowered
        .replace('\u{2010}', "-")
        .replace('\u{2013}', "-")
        .replace('\u{2014}', "-");
    let stripped: String = unified
        .chars()
        .filter(|c| !".,!?;:'\"()".contains(*c))
        .collect();
    collapse_ws(&stripped)
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_ws(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\s+").unwrap());
    re.replace_all(text.trim(), " ").to_string()
}

/// Lowercased word tokens of at least `min_len` characters.
///
/// Only lengths 4 and 5 are used by the pipeline, so the two regexes
/// are compiled once.
pub fn long_words(text: &str, min_len: usize) -> Vec<String> {
    static RE4: OnceLock<Regex> = OnceLock::new();
    static RE5: OnceLock<Regex> = OnceLock::new();
    let re = match min_len {
        4 => RE4.get_or_init(|| Regex::new(r"\b\w{4,}\b").unwrap()),
        _ => RE5.get_or_init(|| Regex::new(r"\b\w{5,}\b").unwrap()),
    };
    re.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Whitespace-delimited token set of a normalized string.
pub fn token_set(normalized: &str) -> HashSet<String> {
    normalized.split_whitespace().map(str::to_string).collect()
}

/// Key terms of a normalized string: tokens of length >= 4 outside the
/// common-word set, plus any token carrying a digit or currency symbol.
pub fn key_terms(normalized: &str) -> HashSet<String> {
    let mut terms = HashSet::new();
    for token in normalized.split_whitespace() {
        let distinctive = token.chars().count() >= 4 && !COMMON_WORDS.contains(&token);
        let has_figure = token.chars().any(|c| c.is_ascii_digit() || c == '£');
        if distinctive || has_figure {
            terms.insert(token.to_string());
        }
    }
    terms
}

/// Jaccard overlap of two token sets (intersection over union).
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let inter = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// Number of tokens shared by two sets.
pub fn overlap(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    a.intersection(b).count()
}

/// First `n` whitespace tokens re-joined, used as a containment probe.
pub fn leading_phrase(normalized: &str, n: usize) -> String {
    normalized
        .split_whitespace()
        .take(n)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deduplicate while preserving first-seen order.
pub fn dedup_preserve_order(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowers_and_collapses() {
        assert_eq!(
            normalize_for_match("  What   IS\nProximate  "),
            "what is proximate"
        );
    }

    #[test]
    fn test_normalize_strips_sentence_punctuation() {
        assert_eq!(
            normalize_for_match("What is the proximate cause?"),
            "what is the proximate cause"
        );
    }

    #[test]
    fn test_normalize_unifies_dashes() {
        assert_eq!(normalize_for_match("co\u{2013}insurance"), "co-insurance");
    }

    #[test]
    fn test_long_words_min_four() {
        assert_eq!(
            long_words("The cat hears marine insurance", 4),
            vec!["hears", "marine", "insurance"]
        );
    }

    #[test]
    fn test_key_terms_filters_common_words() {
        let terms = key_terms("what is the proximate cause of £500 loss");
        assert!(terms.contains("proximate"));
        assert!(terms.contains("cause"));
        assert!(terms.contains("loss"));
        assert!(terms.contains("£500"));
        assert!(!terms.contains("what"));
        assert!(!terms.contains("the"));
    }

    #[test]
    fn test_jaccard() {
        let a = token_set("one two three four");
        let b = token_set("one two three five");
        let j = jaccard(&a, &b);
        assert!((j - 0.6).abs() < 1e-9);
        assert_eq!(overlap(&a, &b), 3);
    }

    #[test]
    fn test_jaccard_empty_sets() {
        let a = HashSet::new();
        let b = HashSet::new();
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn test_leading_phrase() {
        assert_eq!(leading_phrase("a b c d", 2), "a b");
        assert_eq!(leading_phrase("a b", 20), "a b");
    }

    #[test]
    fn test_dedup_preserve_order() {
        let out = dedup_preserve_order(
            ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect(),
        );
        assert_eq!(out, vec!["b", "a", "c"]);
    }
}
