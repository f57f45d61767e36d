//! Per-document assembly of final question records.
//!
//! For each document: extract the answer key, segment the question
//! body (everything before the answer section) into candidates, then
//! resolve each candidate's correct answer from the highest-priority
//! source that yields letters actually present among its options:
//!
//! 1. the curated explanations corpus,
//! 2. the document's answer key,
//! 3. an inline `<number> <letter>` line near the question,
//! 4. the first option, flagged low-confidence.
//!
//! Ids are assigned sequentially across documents in processing
//! order, so an unchanged document set reproduces the same ids.

use std::collections::HashSet;

use crate::answer_key::{self, AnswerKey};
use crate::corpus::ExplanationCorpus;
use crate::segment::{self, CandidateQuestion};
use crate::types::{split_letters, AnswerSource, Question, RawDocument, UNORDERED_SORT_KEY};

/// Build the full question set from extracted documents.
pub fn assemble(documents: &[RawDocument], corpus: &ExplanationCorpus) -> Vec<Question> {
    let mut questions = Vec::new();
    let mut next_id: u32 = 1;

    for document in documents {
        let key = answer_key::extract(&document.text);
        let body_end = answer_key::section_start(&document.text).unwrap_or(document.text.len());

        for candidate in segment::segment(&document.text[..body_end]) {
            let (correct_answer, answer_source) = resolve_answer(&candidate, &key, corpus);
            let original_order = candidate
                .number
                .parse::<u64>()
                .unwrap_or(UNORDERED_SORT_KEY);

            questions.push(Question {
                id: next_id,
                question_text: candidate.stem,
                is_multiple_choice: correct_answer.contains(','),
                correct_answer,
                options: candidate.options,
                explanation: String::new(),
                source_file: document.name.clone(),
                learning_objective: key.objective(&candidate.number).map(str::to_string),
                question_number: candidate.number,
                original_order,
                answer_source,
            });
            next_id += 1;
        }
    }

    questions
}

/// Pick the correct answer from the highest-priority source whose
/// letters all exist among the candidate's options; sources that name
/// a missing letter are skipped entirely.
fn resolve_answer(
    candidate: &CandidateQuestion,
    key: &AnswerKey,
    corpus: &ExplanationCorpus,
) -> (String, AnswerSource) {
    let letters: HashSet<char> = candidate.options.iter().map(|o| o.letter).collect();
    let usable = |answer: &str| {
        let parsed = split_letters(answer);
        !parsed.is_empty() && parsed.iter().all(|l| letters.contains(l))
    };

    if let Some(answer) = corpus.lookup_answer(&candidate.stem) {
        if usable(&answer) {
            return (answer, AnswerSource::Corpus);
        }
    }
    if let Some(answer) = key.answer(&candidate.number) {
        if usable(answer) {
            return (answer.to_string(), AnswerSource::AnswerKey);
        }
    }
    if let Some(letter) = candidate.inline_answer {
        if letters.contains(&letter) {
            return (letter.to_string(), AnswerSource::InlineGuess);
        }
    }
    // Segmentation guarantees at least two options.
    (
        candidate.options[0].letter.to_string(),
        AnswerSource::DefaultFirstOption,
    )
}
