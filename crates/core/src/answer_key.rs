//! Answer-key section extraction.
//!
//! Exam papers append a bounded answer section ("Specimen Examination
//! Answers", "Answer Key", ...). Within it, a strict row pattern
//! `<num> <letters> <major.minor>` captures the answer together with
//! its learning objective; a looser `<num> <letters>` pattern fills in
//! only the question numbers the strict pattern missed, so strict
//! entries always win.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Per-document answer key: question number -> comma-joined letters,
/// and question number -> learning-objective major component.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnswerKey {
    pub answers: HashMap<String, String>,
    pub objectives: HashMap<String, String>,
}

impl AnswerKey {
    pub fn answer(&self, question_number: &str) -> Option<&str> {
        self.answers.get(question_number).map(String::as_str)
    }

    pub fn objective(&self, question_number: &str) -> Option<&str> {
        self.objectives.get(question_number).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// Ordered header patterns; the first one that matches wins.
fn section_headers() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)specimen examination answers",
            r"(?i)answers?\s+and\s+learning\s+outcomes",
            r"(?i)answer\s+key",
            r"(?i)answers?",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Extract the answer key from a document's full text. Returns an
/// empty key when no answer section is present.
pub fn extract(document_text: &str) -> AnswerKey {
    let Some(section) = locate_section(document_text) else {
        return AnswerKey::default();
    };

    let mut key = AnswerKey::default();

    // Strict rows: "1 C 1.4" or "41 A,B,C 1.2".
    static RE_STRICT: OnceLock<Regex> = OnceLock::new();
    let strict = RE_STRICT
        .get_or_init(|| Regex::new(r"(\d+)\s+([A-E](?:,\s*[A-E])*)\s+(\d+\.\d+)").unwrap());
    for caps in strict.captures_iter(section) {
        let number = caps[1].to_string();
        key.objectives
            .insert(number.clone(), objective_major(&caps[3]));
        key.answers.insert(number, normalize_letters(&caps[2]));
    }

    // Loose rows fill in the gaps only.
    static RE_LOOSE: OnceLock<Regex> = OnceLock::new();
    let loose = RE_LOOSE.get_or_init(|| {
        Regex::new(r"(?m)^(\d+)[.)]?[ \t]+([A-E](?:,[ \t]*[A-E])*)\b(?:[ \t]+(\d+\.\d+))?").unwrap()
    });
    for caps in loose.captures_iter(section) {
        let number = caps[1].to_string();
        if key.answers.contains_key(&number) {
            continue;
        }
        key.answers
            .insert(number.clone(), normalize_letters(&caps[2]));
        if let Some(objective) = caps.get(3) {
            key.objectives.insert(number, objective_major(objective.as_str()));
        }
    }

    key
}

/// Byte offset where the answer section's header begins, if any.
/// Question parsing stops here so key rows never leak into options.
pub fn section_start(text: &str) -> Option<usize> {
    section_headers()
        .iter()
        .find_map(|header| header.find(text))
        .map(|m| m.start())
}

/// The answer section runs from the first matching header to the next
/// blank-line gap (triple newline) or the end of the text.
fn locate_section(text: &str) -> Option<&str> {
    let start = section_start(text)?;
    let tail = &text[start..];
    let end = tail.find("\n\n\n").unwrap_or(tail.len());
    Some(&tail[..end])
}

/// Uppercase and re-join letters without internal spaces ("a, b" -> "A,B").
pub(crate) fn normalize_letters(raw: &str) -> String {
    raw.split(',')
        .map(|part| part.trim().to_uppercase())
        .collect::<Vec<_>>()
        .join(",")
}

/// Reduce "1.4" to its major component "1".
fn objective_major(objective: &str) -> String {
    objective
        .split('.')
        .next()
        .unwrap_or(objective)
        .to_string()
}
