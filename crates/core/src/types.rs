use serde::{Deserialize, Serialize};

/// Sort key assigned to questions whose in-document number is not
/// numeric; sorts after every real question number.
pub const UNORDERED_SORT_KEY: u64 = 999_999;

/// One lettered answer option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Option letter, `A`..=`E`, unique within a question.
    pub letter: char,
    pub text: String,
}

/// Where a question's `correct_answer` came from, in priority order.
///
/// `DefaultFirstOption` is the low-confidence flag: no corpus entry,
/// answer-key row, or inline answer line was found and the first
/// option's letter was fabricated as a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Corpus,
    AnswerKey,
    InlineGuess,
    DefaultFirstOption,
}

/// One extracted multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Process-unique id, assigned sequentially across all documents
    /// in file-processing order. Stable for an unchanged document
    /// set, NOT stable across content or ordering changes; history
    /// keyed by old ids must be discarded after re-ingestion.
    pub id: u32,
    /// Normalized question stem (whitespace-collapsed).
    pub question_text: String,
    /// Options in document order; always at least two.
    pub options: Vec<AnswerOption>,
    /// One or more letters, comma-joined (`"C"`, `"A,B"`). Every
    /// letter appears among `options`.
    pub correct_answer: String,
    /// True iff `correct_answer` holds more than one letter.
    pub is_multiple_choice: bool,
    /// Filled lazily at feedback time; empty in the persisted set.
    #[serde(default)]
    pub explanation: String,
    pub source_file: String,
    /// Original in-document numbering; may be non-numeric.
    pub question_number: String,
    /// Major component of the learning objective ("1.4" -> "1").
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub learning_objective: Option<String>,
    /// Numeric sort key derived from `question_number`;
    /// [`UNORDERED_SORT_KEY`] when non-numeric.
    pub original_order: u64,
    pub answer_source: AnswerSource,
}

impl Question {
    /// Letters of `correct_answer`, trimmed and uppercased.
    pub fn correct_letters(&self) -> Vec<char> {
        split_letters(&self.correct_answer)
    }

    /// Text of the option carrying `letter`, if any.
    pub fn option_text(&self, letter: char) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.letter == letter)
            .map(|o| o.text.as_str())
    }

    /// True when the answer was fabricated from the first option and
    /// should be surfaced for manual review.
    pub fn is_low_confidence(&self) -> bool {
        self.answer_source == AnswerSource::DefaultFirstOption
    }
}

/// Split a comma-joined answer string into uppercase letters.
pub fn split_letters(answer: &str) -> Vec<char> {
    answer
        .split(',')
        .filter_map(|part| part.trim().chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// A source document reduced to its name and extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub name: String,
    pub text: String,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A trimmed, cleaned study-text paragraph returned as supporting
/// context for a question. At most 50 words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyExcerpt {
    pub source_file: String,
    pub text: String,
    pub relevance_score: u32,
}

/// The record returned for one submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub is_correct: bool,
    pub correct_answer: String,
    pub correct_option_text: String,
    pub selected_option_text: String,
    pub is_multiple_choice: bool,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub learning_objective: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_letters_single() {
        assert_eq!(split_letters("C"), vec!['C']);
    }

    #[test]
    fn test_split_letters_multi_with_spaces() {
        assert_eq!(split_letters("a, b,C"), vec!['A', 'B', 'C']);
    }

    #[test]
    fn test_question_roundtrips_through_json() {
        let q = Question {
            id: 7,
            question_text: "What is subrogation?".to_string(),
            options: vec![
                AnswerOption {
                    letter: 'A',
                    text: "first".to_string(),
                },
                AnswerOption {
                    letter: 'B',
                    text: "second".to_string(),
                },
            ],
            correct_answer: "B".to_string(),
            is_multiple_choice: false,
            explanation: String::new(),
            source_file: "paper.pdf".to_string(),
            question_number: "7".to_string(),
            learning_objective: Some("3".to_string()),
            original_order: 7,
            answer_source: AnswerSource::AnswerKey,
        };
        let json = serde_json::to_string(&q).unwrap();
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(q, back);
    }

    #[test]
    fn test_low_confidence_flag() {
        let mut q = Question {
            id: 1,
            question_text: "stem".to_string(),
            options: vec![],
            correct_answer: "A".to_string(),
            is_multiple_choice: false,
            explanation: String::new(),
            source_file: String::new(),
            question_number: "1".to_string(),
            learning_objective: None,
            original_order: 1,
            answer_source: AnswerSource::DefaultFirstOption,
        };
        assert!(q.is_low_confidence());
        q.answer_source = AnswerSource::Corpus;
        assert!(!q.is_low_confidence());
    }
}
