//! Answer feedback synthesis.
//!
//! Given a question, the learner's selected letters, and the ranked
//! study excerpts for that question, produce a [`Feedback`] record
//! whose explanation is, in order of preference:
//!
//! 1. the question's own corpus-sourced explanation,
//! 2. the best explanatory sentence mined from the excerpts,
//! 3. the first on-topic sentence of the top excerpt,
//! 4. a minimal "this relates to ..." pointer.
//!
//! Every path runs through the same final polish so the message reads
//! as a single clean sentence with the correct/incorrect prefix.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::ocr::correct_ocr;
use crate::text::{collapse_ws, dedup_preserve_order, long_words};
use crate::types::{split_letters, Feedback, Question, StudyExcerpt};
use crate::Error;

/// Generic words excluded from the important-term set.
const FEEDBACK_STOP_WORDS: &[&str] = &[
    "which", "there", "their", "would", "could", "should", "about", "other", "these", "those",
    "court", "legal", "law", "policy", "cover", "invalid",
];

/// Study-guide navigation phrases; sentences built around these teach
/// nothing about the answer.
const INSTRUCTIONAL_PHRASES: &[&str] = &[
    "after you have",
    "you may study",
    "you should",
    "you will learn",
    "this section",
    "next section",
    "previous section",
];

/// Phrases that signal a sentence defines or explains something.
const EXPLANATORY_MARKERS: &[&str] = &[
    "means",
    "refers",
    "defined",
    "definition",
    "is when",
    "is that",
    "applies when",
    "applies",
    "occurs",
    "requires",
    "entitles",
    "allows",
];

const MAX_IMPORTANT_TERMS: usize = 10;
const MIN_SENTENCE_WORDS: usize = 8;

/// Grade a submitted answer and build the feedback record.
///
/// Multi-select questions require the exact letter set; a partial
/// selection is wrong. Errors only when the stored correct letters or
/// the submitted letters resolve to no option at all.
pub fn feedback_for(
    question: &Question,
    selected: &str,
    excerpts: &[StudyExcerpt],
) -> Result<Feedback, Error> {
    let correct_letters = question.correct_letters();
    let selected_letters = split_letters(selected);

    let correct_texts = resolve_option_texts(question, &correct_letters);
    if correct_texts.is_empty() {
        return Err(Error::UnknownCorrectAnswer {
            question_id: question.id,
            answer: question.correct_answer.clone(),
        });
    }
    let selected_texts = resolve_option_texts(question, &selected_letters);
    if selected_texts.is_empty() {
        return Err(Error::UnknownSelectedAnswer {
            question_id: question.id,
            answer: selected.to_string(),
        });
    }

    let correct_set: HashSet<char> = correct_letters.iter().copied().collect();
    let selected_set: HashSet<char> = selected_letters.iter().copied().collect();
    let is_correct = correct_set == selected_set;

    let correct_option_text = correct_texts.join(", ");
    let selected_option_text = selected_texts.join(", ");

    let body = if question.explanation.trim().is_empty() {
        synthesize(&question.question_text, &correct_option_text, excerpts)
    } else {
        Some(question.explanation.clone())
    };
    let explanation = compose_message(is_correct, &correct_option_text, &selected_option_text, body);

    Ok(Feedback {
        is_correct,
        correct_answer: question.correct_answer.clone(),
        correct_option_text,
        selected_option_text,
        is_multiple_choice: question.is_multiple_choice,
        explanation,
        learning_objective: question.learning_objective.clone(),
    })
}

fn resolve_option_texts(question: &Question, letters: &[char]) -> Vec<String> {
    letters
        .iter()
        .filter_map(|&letter| question.option_text(letter))
        .map(str::to_string)
        .collect()
}

fn compose_message(
    is_correct: bool,
    correct_text: &str,
    selected_text: &str,
    body: Option<String>,
) -> String {
    match body {
        Some(body) => {
            let polished = polish(&body);
            if is_correct {
                format!("Correct! {polished}")
            } else {
                format!("The correct answer is {correct_text}. {polished}")
            }
        }
        None => {
            if is_correct {
                format!("Correct! {correct_text} is the right answer.")
            } else {
                format!("The correct answer is {correct_text}. You selected {selected_text}.")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Excerpt mining
// ---------------------------------------------------------------------------

/// Mine the excerpts for an explanation body. `None` only when there
/// are no excerpts at all.
fn synthesize(stem: &str, correct_text: &str, excerpts: &[StudyExcerpt]) -> Option<String> {
    if excerpts.is_empty() {
        return None;
    }
    let terms = important_terms(stem, correct_text);

    // Best explanatory sentence across all excerpts, by how many
    // important terms it carries. Stable sort keeps excerpt order on
    // ties.
    let mut candidates: Vec<(usize, &str)> = Vec::new();
    for excerpt in excerpts {
        for sentence in split_sentences(&excerpt.text) {
            let lower = sentence.to_lowercase();
            let count = terms.iter().filter(|t| lower.contains(t.as_str())).count();
            if count > 0
                && is_explanatory(&lower)
                && sentence.split_whitespace().count() > MIN_SENTENCE_WORDS
            {
                candidates.push((count, sentence));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, sentence) in &candidates {
        if let Some(cleaned) = clean_sentence(sentence, 50) {
            return Some(cleaned);
        }
    }

    // First on-topic, non-instructional sentence of the top excerpt.
    if let Some(top) = excerpts.first() {
        for sentence in split_sentences(&top.text) {
            let lower = sentence.to_lowercase();
            if is_instructional(&lower) {
                continue;
            }
            if terms.iter().any(|t| lower.contains(t.as_str())) {
                if let Some(cleaned) = clean_sentence(sentence, 40) {
                    return Some(cleaned);
                }
            }
        }
    }

    Some(format!("This relates to {}.", correct_text.to_lowercase()))
}

/// Terms worth finding in study text: distinctive stem words of length
/// >= 5 plus answer-text words of length >= 5, capped at 10.
fn important_terms(stem: &str, correct_text: &str) -> Vec<String> {
    let mut terms: Vec<String> = long_words(stem, 5)
        .into_iter()
        .filter(|w| !FEEDBACK_STOP_WORDS.contains(&w.as_str()))
        .collect();
    terms.extend(
        long_words(correct_text, 4)
            .into_iter()
            .filter(|w| w.chars().count() > 4),
    );
    let mut terms = dedup_preserve_order(terms);
    terms.truncate(MAX_IMPORTANT_TERMS);
    terms
}

fn split_sentences(text: &str) -> Vec<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[.!?]\s+").unwrap());
    re.split(text).map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn is_explanatory(sentence_lower: &str) -> bool {
    EXPLANATORY_MARKERS.iter().any(|m| sentence_lower.contains(m))
        || sentence_lower
            .split_whitespace()
            .any(|w| w == "is" || w == "are")
}

fn is_instructional(sentence_lower: &str) -> bool {
    INSTRUCTIONAL_PHRASES.iter().any(|p| sentence_lower.contains(p))
}

/// Normalize a mined sentence: drop stray leading markers, fix OCR
/// artifacts, cap the length. `None` when too little text survives.
fn clean_sentence(sentence: &str, max_words: usize) -> Option<String> {
    static RE_LEAD_LETTER: OnceLock<Regex> = OnceLock::new();
    static RE_LEAD_NUM: OnceLock<Regex> = OnceLock::new();
    static RE_DOTS: OnceLock<Regex> = OnceLock::new();
    let lead_letter = RE_LEAD_LETTER.get_or_init(|| Regex::new(r"^[A-Z]\s+").unwrap());
    let lead_num = RE_LEAD_NUM.get_or_init(|| Regex::new(r"^\d+[.)]\s*").unwrap());
    let dots = RE_DOTS.get_or_init(|| Regex::new(r"\.{2,}").unwrap());

    let mut cleaned = sentence.trim().to_string();
    cleaned = lead_letter.replace(&cleaned, "").to_string();
    cleaned = lead_num.replace(&cleaned, "").to_string();
    cleaned = dots.replace_all(&cleaned, ".").to_string();
    cleaned = correct_ocr(&cleaned);

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() < MIN_SENTENCE_WORDS {
        return None;
    }
    if words.len() <= max_words {
        return Some(collapse_ws(&cleaned));
    }

    let capped = words[..max_words].join(" ");
    let boundary = capped
        .char_indices()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(i, _)| i)
        .next_back();
    if let Some(pos) = boundary {
        if pos as f64 > capped.len() as f64 * 0.7 {
            return Some(capped[..=pos].trim().to_string());
        }
    }
    Some(capped)
}

// ---------------------------------------------------------------------------
// Final polish
// ---------------------------------------------------------------------------

/// Shared last pass over every explanation body: strip list markers
/// and study-guide navigation clauses, tidy the edges, capitalize, and
/// guarantee terminal punctuation.
fn polish(body: &str) -> String {
    static RE_LIST_MARKER: OnceLock<Regex> = OnceLock::new();
    static RE_INSTRUCTIONAL: OnceLock<Regex> = OnceLock::new();
    static RE_LEAD_TRIM: OnceLock<Regex> = OnceLock::new();
    static RE_TAIL_TRIM: OnceLock<Regex> = OnceLock::new();
    let list_marker =
        RE_LIST_MARKER.get_or_init(|| Regex::new(r"(?m)^\s*(?:[\u{2022}*]|\d+[.)])\s*").unwrap());
    let instructional = RE_INSTRUCTIONAL.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:after you have|you may study|you should|you will learn|this section|next section|previous section)\b[^.!?]*[.!?]?",
        )
        .unwrap()
    });
    let lead_trim = RE_LEAD_TRIM.get_or_init(|| Regex::new(r"^[\s,;:]+").unwrap());
    let tail_trim = RE_TAIL_TRIM.get_or_init(|| Regex::new(r"[,;:]+$").unwrap());

    let mut text = list_marker.replace_all(body.trim(), "").to_string();
    text = instructional.replace_all(&text, "").to_string();
    text = collapse_ws(&text);
    text = lead_trim.replace(&text, "").to_string();
    text = tail_trim.replace(&text, "").to_string();
    text = capitalize_first(&text);
    if !text.is_empty() && !text.ends_with(['.', '!', '?']) {
        text.push('.');
    }
    correct_ocr(&text)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnswerOption, AnswerSource};

    fn option(letter: char, text: &str) -> AnswerOption {
        AnswerOption {
            letter,
            text: text.to_string(),
        }
    }

    fn question(correct: &str) -> Question {
        Question {
            id: 1,
            question_text: "What doctrine allows an insurer to recover a settled claim from a negligent third party".to_string(),
            options: vec![
                option('A', "subrogation"),
                option('B', "contribution"),
                option('C', "average"),
                option('D', "indemnity"),
            ],
            correct_answer: correct.to_string(),
            is_multiple_choice: correct.contains(','),
            explanation: String::new(),
            source_file: "paper.pdf".to_string(),
            question_number: "1".to_string(),
            learning_objective: None,
            original_order: 1,
            answer_source: AnswerSource::AnswerKey,
        }
    }

    fn excerpt(text: &str) -> StudyExcerpt {
        StudyExcerpt {
            source_file: "study.txt".to_string(),
            text: text.to_string(),
            relevance_score: 5,
        }
    }

    #[test]
    fn test_correct_answer_without_excerpts() {
        let fb = feedback_for(&question("A"), "A", &[]).unwrap();
        assert!(fb.is_correct);
        assert_eq!(fb.explanation, "Correct! subrogation is the right answer.");
    }

    #[test]
    fn test_incorrect_answer_without_excerpts() {
        let fb = feedback_for(&question("A"), "B", &[]).unwrap();
        assert!(!fb.is_correct);
        assert_eq!(
            fb.explanation,
            "The correct answer is subrogation. You selected contribution."
        );
    }

    #[test]
    fn test_multi_select_order_insensitive() {
        let mut q = question("A,B");
        q.is_multiple_choice = true;
        let fb = feedback_for(&q, "B, a", &[]).unwrap();
        assert!(fb.is_correct);
        assert_eq!(fb.correct_option_text, "subrogation, contribution");
    }

    #[test]
    fn test_partial_multi_select_is_wrong() {
        let mut q = question("A,B");
        q.is_multiple_choice = true;
        let fb = feedback_for(&q, "A", &[]).unwrap();
        assert!(!fb.is_correct);
    }

    #[test]
    fn test_unknown_correct_letter_errors() {
        let err = feedback_for(&question("E"), "A", &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownCorrectAnswer { .. }));
    }

    #[test]
    fn test_unknown_selected_letter_errors() {
        let err = feedback_for(&question("A"), "E", &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownSelectedAnswer { .. }));
    }

    #[test]
    fn test_stored_explanation_is_preferred_over_excerpts() {
        let mut q = question("A");
        q.explanation = "subrogation transfers recovery rights to the insurer".to_string();
        let fb = feedback_for(
            &q,
            "A",
            &[excerpt("Subrogation means something else entirely in this excerpt text here.")],
        )
        .unwrap();
        assert_eq!(
            fb.explanation,
            "Correct! Subrogation transfers recovery rights to the insurer."
        );
    }

    #[test]
    fn test_explanatory_sentence_mined_from_excerpts() {
        let fb = feedback_for(
            &question("A"),
            "B",
            &[excerpt(
                "Subrogation means the insurer steps into the insured position to recover \
                 the settled claim from the liable party.",
            )],
        )
        .unwrap();
        assert!(!fb.is_correct);
        assert!(fb.explanation.starts_with("The correct answer is subrogation. "));
        assert!(fb.explanation.contains("steps into the insured position"));
    }

    #[test]
    fn test_fallback_pointer_when_excerpt_has_no_usable_sentence() {
        let fb = feedback_for(
            &question("A"),
            "A",
            &[excerpt("Totally unrelated filler words occupy every bit of space available.")],
        )
        .unwrap();
        assert_eq!(fb.explanation, "Correct! This relates to subrogation.");
    }

    #[test]
    fn test_polish_removes_instructional_clause() {
        let polished = polish(
            "subrogation transfers recovery rights. You should read the next chapter carefully.",
        );
        assert_eq!(polished, "Subrogation transfers recovery rights.");
    }

    #[test]
    fn test_polish_capitalizes_and_terminates() {
        assert_eq!(polish("covers the loss in full"), "Covers the loss in full.");
    }

    #[test]
    fn test_polish_strips_list_markers_and_edges() {
        assert_eq!(polish("3. ; the insurer pays,"), "The insurer pays.");
    }

    #[test]
    fn test_instructional_sentence_skipped_in_mining() {
        let body = synthesize(
            "What doctrine covers subrogation recovery rights",
            "subrogation",
            &[excerpt(
                "After you have studied subrogation you may continue. Subrogation transfers the \
                 insurer recovery rights against liable third parties afterwards.",
            )],
        )
        .unwrap();
        assert!(body.starts_with("Subrogation transfers"));
    }

    #[test]
    fn test_clean_sentence_caps_length() {
        let long = "words repeated here ".repeat(30);
        let cleaned = clean_sentence(&long, 50).unwrap();
        assert!(cleaned.split_whitespace().count() <= 50);
    }

    #[test]
    fn test_important_terms_capped_and_deduped() {
        let stem = "insurer insurer premium premium proximate doctrine marine cargo vessel \
                    tonnage salvage voyage charter freight";
        let terms = important_terms(stem, "subrogation");
        assert_eq!(terms.len(), 10);
        assert_eq!(terms.iter().filter(|t| t.as_str() == "insurer").count(), 1);
    }
}
