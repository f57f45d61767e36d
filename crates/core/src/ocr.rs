//! Fixed-dictionary OCR misspelling correction.
//!
//! Scanned study texts carry a recurring set of character-drop errors
//! ("los" for "loss", "ocurs" for "occurs"). Correction is a plain
//! word-by-word dictionary lookup that preserves leading capitalization
//! and trailing punctuation; anything not in the table passes through
//! unchanged.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Known misspelling -> correct spelling, lowercase on both sides.
const CORRECTIONS: &[(&str, &str)] = &[
    ("los", "loss"),
    ("ocurs", "occurs"),
    ("ocured", "occurred"),
    ("wil", "will"),
    ("prof", "proof"),
    ("diferent", "different"),
    ("alowed", "allowed"),
    ("sek", "seek"),
    ("comon", "common"),
    ("efect", "effect"),
    ("vesel", "vessel"),
    ("ben", "been"),
    ("gods", "goods"),
    ("aply", "apply"),
    ("acident", "accident"),
    ("shortfal", "shortfall"),
    ("clasification", "classification"),
];

fn correction_map() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| CORRECTIONS.iter().copied().collect())
}

/// Correct known OCR misspellings word by word.
pub fn correct_ocr(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let map = correction_map();
    let corrected: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            // Peel one trailing punctuation mark so "los." still hits
            // the table.
            let (bare, punct) = match word.chars().last() {
                Some(c) if ".,!?;:".contains(c) => (&word[..word.len() - c.len_utf8()], Some(c)),
                _ => (word, None),
            };

            let lower = bare.to_lowercase();
            let replaced = match map.get(lower.as_str()) {
                Some(fix) => {
                    if bare.chars().next().is_some_and(|c| c.is_uppercase()) {
                        capitalize(fix)
                    } else {
                        (*fix).to_string()
                    }
                }
                None => return word.to_string(),
            };

            match punct {
                Some(p) => format!("{replaced}{p}"),
                None => replaced,
            }
        })
        .collect();

    corrected.join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        assert_eq!(correct_ocr("the insurer pays"), "the insurer pays");
    }

    #[test]
    fn test_simple_correction() {
        assert_eq!(correct_ocr("a total los"), "a total loss");
    }

    #[test]
    fn test_preserves_capitalization() {
        assert_eq!(correct_ocr("Los adjusters"), "Loss adjusters");
    }

    #[test]
    fn test_preserves_trailing_punctuation() {
        assert_eq!(correct_ocr("the claim ocurs."), "the claim occurs.");
        assert_eq!(correct_ocr("wil, however"), "will, however");
    }

    #[test]
    fn test_word_inside_longer_word_untouched() {
        // "lost" must not be rewritten just because "los" is a prefix.
        assert_eq!(correct_ocr("lost at sea"), "lost at sea");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(correct_ocr(""), "");
    }
}
